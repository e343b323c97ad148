//! # Signed Execution Flows
//!
//! Quorum-signed `execute` through the service: ordering, replay, fork
//! separation, contract signers and the four execution primitives.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use keep_core::domain::compute_separator;
    use keep_core::prelude::*;
    use keep_types::{compute_contract_address, compute_contract_address_create2};

    // =========================================================================
    // QUORUM ACCEPTANCE
    // =========================================================================

    #[test]
    fn test_two_of_three_executes_and_publishes() {
        let (service, bus, members) = initialized_service(3, 2);
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Execution]));
        let operation = sample_call();

        let signatures = sign_operation(&service, &[&members[0], &members[2]], &operation);
        service.execute(operation.clone(), signatures).unwrap();

        assert_eq!(service.nonce().unwrap(), 1);
        let calls = service
            .with_engine(|keep| keep.runtime().calls().to_vec())
            .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].caller, unit_address());
        assert_eq!(calls[0].target, operation.to);

        let events = drain(&mut subscription);
        assert_eq!(
            events,
            vec![KeepEvent::Executed {
                kind: OperationKind::Call,
                to: operation.to,
                value: operation.value,
                data: operation.data.clone(),
            }]
        );
    }

    #[test]
    fn test_replay_rejected() {
        let (service, _bus, members) = initialized_service(3, 2);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0], &members[1]], &operation);

        service.execute(operation.clone(), signatures.clone()).unwrap();
        let replay = service.execute(operation, signatures);

        assert!(matches!(replay, Err(KeepError::InvalidSignature(_))));
        assert_eq!(service.nonce().unwrap(), 1);
    }

    #[test]
    fn test_descending_signers_rejected() {
        let (service, _bus, members) = initialized_service(3, 2);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[2], &members[0]], &operation);

        assert_eq!(
            service.execute(operation, signatures),
            Err(KeepError::InvalidSignature(SignatureRejection::OutOfOrder {
                previous: members[2].address,
                signer: members[0].address,
            }))
        );
        assert_eq!(service.nonce().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_signer_rejected() {
        let (service, _bus, members) = initialized_service(3, 2);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[1], &members[1]], &operation);

        assert_eq!(
            service.execute(operation, signatures),
            Err(KeepError::InvalidSignature(SignatureRejection::OutOfOrder {
                previous: members[1].address,
                signer: members[1].address,
            }))
        );
    }

    #[test]
    fn test_too_few_signatures() {
        let (service, _bus, members) = initialized_service(3, 2);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0]], &operation);

        assert_eq!(
            service.execute(operation, signatures),
            Err(KeepError::InvalidSignature(SignatureRejection::Missing {
                supplied: 1,
                required: 2,
            }))
        );
    }

    #[test]
    fn test_outsider_rejected() {
        let (service, _bus, _members) = initialized_service(2, 1);
        let outsider = signers(1).remove(0);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&outsider], &operation);

        assert_eq!(
            service.execute(operation, signatures),
            Err(KeepError::InvalidSignature(SignatureRejection::NotMember(
                outsider.address
            )))
        );
    }

    #[test]
    fn test_execute_before_initialize() {
        let (service, _bus) = fresh_service();
        assert_eq!(
            service.execute(sample_call(), Vec::new()),
            Err(KeepError::NotInitialized)
        );
    }

    // =========================================================================
    // DOMAIN SEPARATION
    // =========================================================================

    #[test]
    fn test_fork_invalidates_prior_signatures() {
        let (service, _bus, members) = initialized_service(1, 1);
        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        assert_eq!(
            service.domain_separator().unwrap(),
            compute_separator(CHAIN_ID, unit_address())
        );

        service
            .with_engine(|keep| keep.runtime_mut().set_chain_id(CHAIN_ID + 4))
            .unwrap();

        assert_eq!(
            service.domain_separator().unwrap(),
            compute_separator(CHAIN_ID + 4, unit_address())
        );
        assert!(matches!(
            service.execute(operation.clone(), signatures),
            Err(KeepError::InvalidSignature(_))
        ));

        // Re-signed against the new chain id
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation, signatures).unwrap();
    }

    #[test]
    fn test_digest_differs_between_units() {
        let (first, _) = create_in_memory_service(unit_address(), CHAIN_ID);
        let (second, _) = create_in_memory_service(Address::from_low_u64(0x1234), CHAIN_ID);
        let operation = sample_call();
        assert_ne!(first.digest(&operation).unwrap(), second.digest(&operation).unwrap());
    }

    // =========================================================================
    // CONTRACT SIGNERS
    // =========================================================================

    #[test]
    fn test_contract_signer_delegates_validation() {
        let (service, _bus, members) = initialized_service(2, 2);
        let contract = &members[1];
        service
            .with_engine(|keep| keep.runtime_mut().deploy_code(contract.address, vec![0x60, 0x00]))
            .unwrap();

        let operation = sample_call();
        let signatures = sign_operation(&service, &[&members[0], contract], &operation);
        assert_eq!(
            service.execute(operation.clone(), signatures.clone()),
            Err(KeepError::InvalidSignature(SignatureRejection::DelegateRejected(
                contract.address
            )))
        );

        let digest = service.digest(&operation).unwrap();
        service
            .with_engine(|keep| keep.runtime_mut().approve_digest(contract.address, digest))
            .unwrap();
        service.execute(operation, signatures).unwrap();
        assert_eq!(service.nonce().unwrap(), 1);
    }

    // =========================================================================
    // EXECUTION PRIMITIVES
    // =========================================================================

    #[test]
    fn test_create_reports_new_contract() {
        let (service, bus, members) = initialized_service(1, 1);
        let mut subscription = bus.subscribe(EventFilter::all());
        let operation = Operation::create(U256::zero(), vec![0x60, 0x80]);

        let expected = compute_contract_address(unit_address(), 0);
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation, signatures).unwrap();

        assert_eq!(
            drain(&mut subscription),
            vec![KeepEvent::ContractCreated {
                kind: OperationKind::Create,
                creation: expected,
                value: U256::zero(),
            }]
        );
        let deployed = service
            .with_engine(|keep| keep.runtime().code_at(expected).is_some())
            .unwrap();
        assert!(deployed);
    }

    #[test]
    fn test_create2_address_is_deterministic() {
        let (service, bus, members) = initialized_service(1, 1);
        let mut subscription = bus.subscribe(EventFilter::all());
        let salt = Hash::from([0x5a; 32]);
        let code = [0x60, 0x01, 0x60, 0x02];
        let operation = Operation::create2(U256::zero(), salt, &code);

        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation.clone(), signatures).unwrap();

        assert_eq!(
            drain(&mut subscription),
            vec![KeepEvent::ContractCreated {
                kind: OperationKind::Create2,
                creation: compute_contract_address_create2(unit_address(), salt, &code),
                value: U256::zero(),
            }]
        );

        // Same salt and code collide on the second attempt
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        assert!(matches!(
            service.execute(operation, signatures),
            Err(KeepError::ExecutionFailed(_))
        ));
        assert_eq!(service.nonce().unwrap(), 1);
    }

    #[test]
    fn test_failed_creation_rolls_back_nonce() {
        let (service, _bus, members) = initialized_service(1, 1);
        let operation = Operation::create(U256::zero(), vec![0xfe]);
        let signatures = sign_operation(&service, &[&members[0]], &operation);

        assert!(matches!(
            service.execute(operation, signatures),
            Err(KeepError::ExecutionFailed(_))
        ));
        assert_eq!(service.nonce().unwrap(), 0);
    }

    #[test]
    fn test_delegate_call_runs_in_unit_context() {
        let (service, _bus, members) = initialized_service(1, 1);
        let library = Address::from_low_u64(0x11b);
        let operation = Operation::delegate_call(library, vec![0x01, 0x02]);

        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation, signatures).unwrap();

        let record = service
            .with_engine(|keep| keep.runtime().calls()[0].clone())
            .unwrap();
        assert!(record.delegate);
        assert_eq!(record.caller, unit_address());
        assert_eq!(record.target, library);
    }

    #[test]
    fn test_value_forwarded_from_unit_balance() {
        let (service, _bus, members) = initialized_service(1, 1);
        let recipient = Address::from_low_u64(0xcafe);
        service
            .with_engine(|keep| keep.runtime_mut().fund(unit_address(), U256::from(100)))
            .unwrap();

        let operation = Operation::call(recipient, U256::from(40), Vec::new());
        let signatures = sign_operation(&service, &[&members[0]], &operation);
        service.execute(operation, signatures).unwrap();

        let (unit_balance, recipient_balance) = service
            .with_engine(|keep| {
                (
                    keep.runtime().balance(unit_address()),
                    keep.runtime().balance(recipient),
                )
            })
            .unwrap();
        assert_eq!(unit_balance, U256::from(60));
        assert_eq!(recipient_balance, U256::from(40));
    }
}
