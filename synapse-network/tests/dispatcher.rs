//! End-to-end traversals through a booted network.

mod common;

use common::{CountingOutput, memory_storage, straight_network, within};
use std::sync::Arc;
use synapse_core::key;
use synapse_core::{SynapseError, TextRequest};
use synapse_network::clg::{self, Output};
use synapse_network::{INPUT_CLG, Network, NetworkConfig, OUTPUT_CLG, TextEndpoint};
use tokio::sync::mpsc;

#[tokio::test]
async fn trigger_reaches_the_output_node() {
    let storage = memory_storage();
    let network = straight_network(Arc::clone(&storage), Arc::new(Output)).await;

    let request = TextRequest::new("hello").with_session_id("s-1");
    let response = within(network.trigger(request)).await.unwrap();
    assert_eq!(response.output, "hello");
    assert_eq!(response.session_id, "s-1");

    network.shutdown().await;
    let snapshot = network.metrics().snapshot();
    assert_eq!(snapshot.in_flight, 0);
    assert_eq!(snapshot.outputs_emitted, 1);
    assert_eq!(snapshot.executions_completed, 2);
    assert_eq!(snapshot.executions_failed, 0);
}

#[tokio::test]
async fn routes_are_learned_and_tracked() {
    let storage = memory_storage();
    let network = straight_network(Arc::clone(&storage), Arc::new(Output)).await;

    within(network.trigger(TextRequest::new("a"))).await.unwrap();
    network.shutdown().await;

    let input_id = network.node_id(INPUT_CLG).unwrap();
    let fan_out = storage
        .get(&key::forward_configuration(&input_id))
        .await
        .unwrap();
    let destinations: Vec<&str> = fan_out.split(',').collect();
    assert_eq!(destinations.len(), 1);

    let routed = storage
        .get(&key::behavior_name(&destinations[0].into()))
        .await
        .unwrap();
    assert_eq!(routed, OUTPUT_CLG);

    // Shutdown waited for tracking, so the edges are in place.
    let edges = network.tracker().connections(&input_id).await.unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].as_str(), destinations[0]);
    let named = network.tracker().name_connections(INPUT_CLG).await.unwrap();
    assert_eq!(named, vec![OUTPUT_CLG.to_string()]);
}

#[tokio::test]
async fn known_routes_replay_on_later_traversals() {
    let storage = memory_storage();
    let network = straight_network(Arc::clone(&storage), Arc::new(Output)).await;

    for input in ["one", "two", "three"] {
        let response = within(network.trigger(TextRequest::new(input))).await.unwrap();
        assert_eq!(response.output, input);
    }
    network.shutdown().await;

    let input_id = network.node_id(INPUT_CLG).unwrap();
    let fan_out = storage
        .get(&key::forward_configuration(&input_id))
        .await
        .unwrap();
    assert!(!fan_out.contains(','));
}

#[tokio::test]
async fn trigger_resends_until_expectation_matches() {
    let storage = memory_storage();
    let network = straight_network(storage, Arc::new(CountingOutput::new())).await;

    let request = TextRequest::new("go").with_expectation("3");
    let response = within(network.trigger(request)).await.unwrap();
    assert_eq!(response.output, "3");

    network.shutdown().await;
    assert_eq!(network.metrics().snapshot().outputs_emitted, 3);
}

#[tokio::test]
async fn ingress_requests_answer_on_egress() {
    let storage = memory_storage();
    let network = straight_network(storage, Arc::new(Output)).await;

    network
        .ingress()
        .send_signal(TextRequest::new("via ingress").with_session_id("s-2"))
        .await
        .unwrap();
    let response = within(network.egress().receive_signal()).await.unwrap();
    assert_eq!(response.output, "via ingress");
    assert_eq!(response.session_id, "s-2");

    network
        .ingress()
        .send_signal(TextRequest::new("mirror").with_echo(true))
        .await
        .unwrap();
    let response = within(network.egress().receive_signal()).await.unwrap();
    assert_eq!(response.output, "mirror");

    network.shutdown().await;
    let err = network
        .ingress()
        .send_signal(TextRequest::new("late"))
        .await
        .unwrap_err();
    assert!(matches!(err, SynapseError::GatewayClosed));
}

#[tokio::test]
async fn endpoint_streams_responses() {
    let storage = memory_storage();
    let network = straight_network(storage, Arc::new(Output)).await;
    let endpoint = TextEndpoint::new(network.clone());

    let (request_tx, request_rx) = mpsc::channel(8);
    let (response_tx, mut response_rx) = mpsc::channel(8);

    request_tx
        .send(TextRequest::new("echoed").with_echo(true))
        .await
        .unwrap();
    request_tx.send(TextRequest::new("")).await.unwrap();
    request_tx
        .send(TextRequest::new("routed").with_session_id("s-3"))
        .await
        .unwrap();
    drop(request_tx);

    within(endpoint.serve(request_rx, response_tx)).await;

    let mut outputs = Vec::new();
    while let Some(response) = response_rx.recv().await {
        outputs.push(response.output);
    }
    outputs.sort();
    assert_eq!(outputs, vec!["echoed".to_string(), "routed".to_string()]);

    network.shutdown().await;
}

#[tokio::test]
async fn sub_networks_follow_the_parent() {
    let storage = memory_storage();
    let sub = Network::builder(NetworkConfig::default().with_shutdown_poll_ms(10))
        .storage(Arc::clone(&storage))
        .clgs(clg::catalog(Arc::clone(&storage)))
        .build()
        .await
        .unwrap();
    let parent = Network::builder(NetworkConfig::default().with_shutdown_poll_ms(10))
        .storage(Arc::clone(&storage))
        .clgs(clg::catalog(Arc::clone(&storage)))
        .sub_network(sub.clone())
        .build()
        .await
        .unwrap();

    parent.boot().await.unwrap();
    assert!(sub.is_booted());

    parent.shutdown().await;
    assert!(parent.is_shut_down());
    assert!(sub.is_shut_down());
}
