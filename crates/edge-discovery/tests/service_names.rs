//! # Service Name Integration Tests
//!
//! Drive `add_new_service_name`, `remove_service_name` and
//! `reset_service_name` on a started service and check both the advertised
//! TXT strings and the local registry records.

mod common;

use std::sync::Arc;

use common::{Node, EXEC_TYPE, PLATFORM};
use edge_discovery::{DiscoveryApi, DiscoveryError, DiscoveryTransport, MAX_TXT_SIZE};

fn local_services(node: &Node) -> (Vec<String>, Vec<String>) {
    let stores = node.service.stores();
    (
        stores.configuration.get(node.local_id()).unwrap().services,
        stores.service.get(node.local_id()).unwrap().services,
    )
}

#[tokio::test]
async fn test_reset_leaves_only_fixed_fields() {
    let node = Node::start().await;
    node.service.add_new_service_name("ls").unwrap();
    node.service.add_new_service_name("vlc").unwrap();

    node.service.reset_service_name();
    assert_eq!(node.transport.text(), vec![PLATFORM, EXEC_TYPE]);
    assert_eq!(local_services(&node), (vec![], vec![]));

    // Resetting again changes nothing
    node.service.reset_service_name();
    assert_eq!(node.transport.text(), vec![PLATFORM, EXEC_TYPE]);
    assert_eq!(local_services(&node), (vec![], vec![]));
}

#[tokio::test]
async fn test_duplicate_name_rejected() {
    let node = Node::start().await;
    node.service.add_new_service_name("svc").unwrap();
    let text_before = node.transport.text();
    let pushes_before = node.transport.set_text_calls();

    let err = node.service.add_new_service_name("svc").unwrap_err();

    assert!(matches!(err, DiscoveryError::InvalidParam(_)));
    assert_eq!(node.transport.text(), text_before);
    assert_eq!(node.transport.set_text_calls(), pushes_before);
    assert_eq!(local_services(&node), (vec!["svc".into()], vec!["svc".into()]));
}

#[tokio::test]
async fn test_reserved_names_rejected() {
    let node = Node::start().await;

    for name in [PLATFORM, EXEC_TYPE] {
        assert!(matches!(
            node.service.add_new_service_name(name),
            Err(DiscoveryError::InvalidParam(_))
        ));
        assert!(matches!(
            node.service.remove_service_name(name),
            Err(DiscoveryError::InvalidParam(_))
        ));
    }
    assert_eq!(node.transport.text(), vec![PLATFORM, EXEC_TYPE]);
}

#[tokio::test]
async fn test_size_budget_enforced() {
    let node = Node::start().await;
    let fixed = PLATFORM.len() + EXEC_TYPE.len();

    // Fill the budget to within 5 bytes
    let filler = "f".repeat(MAX_TXT_SIZE - fixed - 5);
    node.service.add_new_service_name(&filler).unwrap();
    let text_before = node.transport.text();
    let pushes_before = node.transport.set_text_calls();

    let err = node.service.add_new_service_name("sixsix").unwrap_err();
    assert!(matches!(err, DiscoveryError::InvalidParam(_)));
    assert_eq!(node.transport.text(), text_before);
    assert_eq!(node.transport.set_text_calls(), pushes_before);
    assert_eq!(local_services(&node).1, vec![filler.clone()]);

    // Exactly at the budget is accepted
    node.service.add_new_service_name("fiv5e").unwrap();
    assert_eq!(
        node.transport.text().iter().map(String::len).sum::<usize>(),
        MAX_TXT_SIZE
    );
}

#[tokio::test]
async fn test_add_then_remove_round_trip() {
    let node = Node::start().await;
    node.service.add_new_service_name("ls").unwrap();
    let text_before = node.transport.text();
    let stored_before = local_services(&node);

    node.service.add_new_service_name("x").unwrap();
    assert_eq!(node.transport.text().last().map(String::as_str), Some("x"));

    node.service.remove_service_name("x").unwrap();
    assert_eq!(node.transport.text(), text_before);
    assert_eq!(local_services(&node), stored_before);
}

#[tokio::test]
async fn test_concurrent_mutations_do_not_lose_updates() {
    let node = Arc::new(Node::start().await);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let node = node.clone();
            tokio::task::spawn_blocking(move || node.service.add_new_service_name(&format!("svc-{i}")))
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut advertised = node.transport.text()[2..].to_vec();
    advertised.sort();
    let mut expected: Vec<_> = (0..16).map(|i| format!("svc-{i}")).collect();
    expected.sort();
    assert_eq!(advertised, expected);

    let mut stored = local_services(&node).1;
    stored.sort();
    assert_eq!(stored, expected);
}
