//! # Atomicity and Event Publication
//!
//! Failed entry points leave no trace: no ledger, runtime or nonce change
//! and nothing published. Committed entry points publish every event under
//! one correlation id.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use keep_core::prelude::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn relayer_service() -> (MemoryService, std::sync::Arc<InMemoryEventBus>, Address) {
        let (service, bus, members) = initialized_service(1, 1);
        let relayer = Address::from_low_u64(0x0a11);
        let grant = self_call(&KeepCall::Mint {
            to: relayer,
            id: Capability::Multirelay.id(),
            amount: U256::one(),
        });
        let signatures = sign_operation(&service, &[&members[0]], &grant);
        service.execute(grant, signatures).unwrap();
        (service, bus, relayer)
    }

    #[test]
    fn test_failing_batch_member_aborts_whole_batch() {
        let (service, bus, relayer) = relayer_service();
        let mut subscription = bus.subscribe(EventFilter::all());
        let broken = Address::from_low_u64(0xdead);
        let recipient = Address::from_low_u64(0xcafe);
        service
            .with_engine(|keep| {
                keep.runtime_mut().fund(unit_address(), U256::from(10));
                keep.runtime_mut().set_reverting(broken, true);
            })
            .unwrap();
        let nonce_before = service.nonce().unwrap();

        let result = service.multirelay(
            relayer,
            vec![
                Operation::call(recipient, U256::from(4), Vec::new()),
                Operation::call(broken, U256::zero(), Vec::new()),
            ],
        );

        assert!(matches!(result, Err(KeepError::ExecutionFailed(_))));
        assert_eq!(service.nonce().unwrap(), nonce_before);
        let (unit_balance, recipient_balance, calls) = service
            .with_engine(|keep| {
                (
                    keep.runtime().balance(unit_address()),
                    keep.runtime().balance(recipient),
                    keep.runtime().calls().len(),
                )
            })
            .unwrap();
        assert_eq!(unit_balance, U256::from(10));
        assert!(recipient_balance.is_zero());
        assert_eq!(calls, 0);
        assert!(drain(&mut subscription).is_empty());
    }

    #[test]
    fn test_multicall_failure_discards_earlier_calls() {
        let (service, bus, members) = initialized_service(2, 1);
        let mut subscription = bus.subscribe(EventFilter::all());
        let newcomer = Address::from_low_u64(0x0e);

        let result = service.multicall(
            members[0].address,
            vec![
                KeepCall::SetApprovalForAll {
                    operator: newcomer,
                    approved: true,
                },
                KeepCall::Relay(sample_call()),
            ],
        );

        assert_eq!(
            result,
            Err(KeepError::NotAuthorized {
                caller: members[0].address
            })
        );
        let approved = service
            .with_engine(|keep| keep.ledger().is_approved_for_all(members[0].address, newcomer))
            .unwrap();
        assert!(!approved);
        assert!(drain(&mut subscription).is_empty());
    }

    #[test]
    fn test_stats_track_commits_and_rollbacks() {
        let (service, _bus, members) = initialized_service(2, 2);
        let operation = sample_call();

        let bad = sign_operation(&service, &[&members[0]], &operation);
        assert!(service.execute(operation.clone(), bad).is_err());
        let good = sign_operation(&service, &[&members[0], &members[1]], &operation);
        service.execute(operation, good).unwrap();

        let stats = service.stats();
        // initialize + two executes
        assert_eq!(stats.entry_points, 3);
        assert_eq!(stats.committed, 2);
        assert_eq!(stats.rolled_back, 1);
        assert_eq!(stats.signature_rejections, 1);
        assert_eq!(stats.operations_dispatched, 1);
    }

    #[test]
    fn test_events_share_correlation_id() {
        let (service, bus, members) = initialized_service(1, 1);
        let mut subscription = bus.subscribe(EventFilter::all().for_unit(unit_address()));
        let id = TokenId::from(3);
        let both = vec![
            self_call(&KeepCall::SetUri {
                id,
                uri: "ipfs://a".to_string(),
            }),
            self_call(&KeepCall::SetTransferability { id, on: true }),
        ];
        for operation in both {
            let signatures = sign_operation(&service, &[&members[0]], &operation);
            service.execute(operation, signatures).unwrap();
        }

        let mut envelopes = Vec::new();
        while let Ok(Some(envelope)) = subscription.try_recv() {
            envelopes.push(envelope);
        }
        // Uri + Executed, then TransferabilitySet + Executed
        assert_eq!(envelopes.len(), 4);
        assert_eq!(envelopes[0].correlation_id, envelopes[1].correlation_id);
        assert_eq!(envelopes[2].correlation_id, envelopes[3].correlation_id);
        assert_ne!(envelopes[0].correlation_id, envelopes[2].correlation_id);
        assert!(envelopes.iter().all(|e| e.unit == unit_address()));
    }

    #[test]
    fn test_envelope_exports_as_json() {
        let (service, bus, members) = initialized_service(1, 1);
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Execution]));
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation, signatures).unwrap();

        let envelope = subscription.try_recv().unwrap().unwrap();
        let json = envelope.to_json().unwrap();
        assert!(json.contains("Executed"));
        assert!(json.contains(&envelope.correlation_id.to_string()));
    }

    #[test]
    fn test_silent_service_publishes_nothing() {
        let keep = Keep::new(unit_address(), InMemoryLedger::new(), InMemoryRuntime::new(CHAIN_ID));
        let config = ServiceConfig {
            publish_events: false,
            ..ServiceConfig::default()
        };
        let (service, bus) = KeepService::in_memory(keep, config);
        let mut subscription = bus.subscribe(EventFilter::all());

        service
            .initialize(Vec::new(), addresses(&signers(1)), 1)
            .unwrap();

        assert!(drain(&mut subscription).is_empty());
        assert_eq!(service.stats().events_published, 0);
    }

    #[tokio::test]
    async fn test_async_subscriber_sees_committed_execution() {
        let (service, bus, members) = initialized_service(1, 1);
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Execution]));
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0]], &operation);

        let worker = service.clone();
        tokio::task::spawn_blocking(move || worker.execute(operation, signatures))
            .await
            .unwrap()
            .unwrap();

        let envelope = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .expect("event within timeout")
            .expect("bus open");
        assert!(matches!(envelope.event, KeepEvent::Executed { .. }));
    }
}
