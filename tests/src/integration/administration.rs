//! # Administration Flows
//!
//! Self-calls carried by signed operations, capability holders calling entry
//! points directly, transferability, metadata and one-time initialization.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use keep_core::prelude::*;
    use std::sync::Arc;

    fn execute_signed(service: &MemoryService, members: &[&TestSigner], operation: Operation) -> Result<(), KeepError> {
        let signatures = sign_operation(service, members, &operation);
        service.execute(operation, signatures)
    }

    // =========================================================================
    // SIGNED SELF-CALLS
    // =========================================================================

    #[test]
    fn test_signed_mint_adds_member() {
        let (service, bus, members) = initialized_service(2, 2);
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Ledger]));
        let newcomer = signers(1).remove(0);

        let grant = self_call(&KeepCall::Mint {
            to: newcomer.address,
            id: execution_id(),
            amount: U256::one(),
        });
        execute_signed(&service, &[&members[0], &members[1]], grant).unwrap();

        assert_eq!(service.balance_of(newcomer.address, execution_id()).unwrap(), U256::one());
        assert_eq!(service.total_supply(execution_id()).unwrap(), U256::from(3));
        assert_eq!(
            drain(&mut subscription),
            vec![KeepEvent::TransferSingle {
                operator: unit_address(),
                from: Address::ZERO,
                to: newcomer.address,
                id: execution_id(),
                amount: U256::one(),
            }]
        );
    }

    #[test]
    fn test_signed_quorum_raise_takes_effect() {
        let (service, _bus, members) = initialized_service(3, 1);
        let raise = self_call(&KeepCall::SetQuorum { threshold: 3 });
        execute_signed(&service, &[&members[0]], raise).unwrap();
        assert_eq!(service.quorum().unwrap(), 3);

        let two = execute_signed(&service, &[&members[0], &members[1]], sample_call());
        assert!(matches!(
            two,
            Err(KeepError::InvalidSignature(SignatureRejection::Missing { .. }))
        ));
        execute_signed(&service, &[&members[0], &members[1], &members[2]], sample_call()).unwrap();
    }

    #[test]
    fn test_revoke_below_quorum_rolls_back() {
        let (service, _bus, members) = initialized_service(2, 2);
        let revoke = self_call(&KeepCall::Burn {
            from: members[1].address,
            id: execution_id(),
            amount: U256::one(),
        });

        let result = execute_signed(&service, &[&members[0], &members[1]], revoke);

        assert_eq!(
            result,
            Err(KeepError::ExecutionFailed(
                "burn: quorum 2 exceeds total weight 1".to_string()
            ))
        );
        assert_eq!(service.balance_of(members[1].address, execution_id()).unwrap(), U256::one());
        assert_eq!(service.nonce().unwrap(), 0);
    }

    #[test]
    fn test_undecodable_self_call_fails() {
        let (service, _bus, members) = initialized_service(1, 1);
        let garbage = Operation::call(unit_address(), U256::zero(), vec![0xff; 3]);
        assert!(matches!(
            execute_signed(&service, &[&members[0]], garbage),
            Err(KeepError::ExecutionFailed(_))
        ));
    }

    // =========================================================================
    // CAPABILITY HOLDERS
    // =========================================================================

    fn grant(service: &MemoryService, members: &[TestSigner], holder: Address, capability: Capability) {
        let operation = self_call(&KeepCall::Mint {
            to: holder,
            id: capability.id(),
            amount: U256::one(),
        });
        let approvers: Vec<&TestSigner> = members.iter().collect();
        execute_signed(service, &approvers, operation).unwrap();
    }

    #[test]
    fn test_capability_holder_mints_directly() {
        let (service, _bus, members) = initialized_service(1, 1);
        let minter = Address::from_low_u64(0x0a11);
        let recipient = Address::from_low_u64(0x0b0b);
        let id = TokenId::from(7);
        let call = KeepCall::Mint {
            to: recipient,
            id,
            amount: U256::from(5),
        };

        assert_eq!(
            service.call(minter, call.clone()),
            Err(KeepError::NotAuthorized { caller: minter })
        );

        grant(&service, &members, minter, Capability::Mint);
        service.call(minter, call).unwrap();
        assert_eq!(service.balance_of(recipient, id).unwrap(), U256::from(5));
    }

    #[test]
    fn test_capabilities_are_distinct() {
        let (service, _bus, members) = initialized_service(1, 1);
        let relayer = Address::from_low_u64(0x0a11);
        grant(&service, &members, relayer, Capability::Relay);

        service.relay(relayer, sample_call()).unwrap();
        assert_eq!(
            service.multirelay(relayer, vec![sample_call()]),
            Err(KeepError::NotAuthorized { caller: relayer })
        );

        grant(&service, &members, relayer, Capability::Multirelay);
        let before = service.nonce().unwrap();
        service
            .multirelay(relayer, vec![sample_call(), sample_call()])
            .unwrap();
        assert_eq!(service.nonce().unwrap(), before + 2);
    }

    #[test]
    fn test_multicall_runs_several_entry_points() {
        let (service, bus, members) = initialized_service(1, 1);
        let admin = Address::from_low_u64(0x0ad);
        grant(&service, &members, admin, Capability::SetUri);
        grant(&service, &members, admin, Capability::SetTransferability);
        let mut subscription = bus.subscribe(EventFilter::all());
        let id = TokenId::from(42);

        service
            .multicall(
                admin,
                vec![
                    KeepCall::SetUri {
                        id,
                        uri: "ipfs://keep/42".to_string(),
                    },
                    KeepCall::SetTransferability { id, on: true },
                ],
            )
            .unwrap();

        assert_eq!(service.uri(id).unwrap(), "ipfs://keep/42");
        let events = drain(&mut subscription);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], KeepEvent::TransferabilitySet { on: true, .. }));
    }

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    #[test]
    fn test_membership_not_transferable_by_default() {
        let (service, _bus, members) = initialized_service(2, 1);
        let outsider = Address::from_low_u64(0x0e);
        let transfer = KeepCall::SafeTransferFrom {
            from: members[0].address,
            to: outsider,
            id: execution_id(),
            amount: U256::one(),
        };

        assert_eq!(
            service.call(members[0].address, transfer.clone()),
            Err(KeepError::NonTransferable(execution_id()))
        );

        let enable = self_call(&KeepCall::SetTransferability {
            id: execution_id(),
            on: true,
        });
        execute_signed(&service, &[&members[0]], enable).unwrap();

        service.call(members[0].address, transfer).unwrap();
        assert_eq!(service.balance_of(outsider, execution_id()).unwrap(), U256::one());
        assert!(service.balance_of(members[0].address, execution_id()).unwrap().is_zero());
    }

    #[test]
    fn test_operator_approval_allows_transfer() {
        let (service, _bus, members) = initialized_service(1, 1);
        let id = TokenId::from(9);
        let owner = Address::from_low_u64(0x01);
        let operator = Address::from_low_u64(0x02);
        let enable = self_call(&KeepCall::SetTransferability { id, on: true });
        let fund = self_call(&KeepCall::Mint {
            to: owner,
            id,
            amount: U256::from(3),
        });
        execute_signed(&service, &[&members[0]], enable).unwrap();
        execute_signed(&service, &[&members[0]], fund).unwrap();

        let transfer = KeepCall::SafeTransferFrom {
            from: owner,
            to: operator,
            id,
            amount: U256::from(2),
        };
        assert_eq!(
            service.call(operator, transfer.clone()),
            Err(KeepError::NotAuthorized { caller: operator })
        );

        service
            .call(
                owner,
                KeepCall::SetApprovalForAll {
                    operator,
                    approved: true,
                },
            )
            .unwrap();
        service.call(operator, transfer).unwrap();
        assert_eq!(service.balance_of(operator, id).unwrap(), U256::from(2));
    }

    // =========================================================================
    // METADATA
    // =========================================================================

    #[test]
    fn test_uri_falls_back_to_metadata_source() {
        let source = StaticMetadata::with_base("ipfs://fallback/");
        let keep = Keep::new(unit_address(), InMemoryLedger::new(), InMemoryRuntime::new(CHAIN_ID))
            .with_metadata(Arc::new(source));
        let (service, _bus) = KeepService::in_memory(keep, ServiceConfig::default());
        let members = signers(1);
        service
            .initialize(Vec::new(), addresses(&members), 1)
            .unwrap();

        let id = TokenId::from(5);
        assert_eq!(service.uri(id).unwrap(), "ipfs://fallback/5");

        let set = self_call(&KeepCall::SetUri {
            id,
            uri: "ipfs://own/5".to_string(),
        });
        execute_signed(&service, &[&members[0]], set).unwrap();
        assert_eq!(service.uri(id).unwrap(), "ipfs://own/5");
    }

    #[test]
    fn test_uri_empty_without_source() {
        let (service, _bus) = fresh_service();
        assert_eq!(service.uri(TokenId::from(1)).unwrap(), "");
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    #[test]
    fn test_initialize_exactly_once() {
        let (service, _bus, members) = initialized_service(2, 1);
        assert_eq!(
            service.initialize(Vec::new(), addresses(&members), 1),
            Err(KeepError::AlreadyInitialized)
        );
        assert_eq!(service.total_supply(execution_id()).unwrap(), U256::from(2));
    }

    #[test]
    fn test_initialize_rejects_bad_thresholds() {
        let (service, _bus) = fresh_service();
        let members = addresses(&signers(2));

        assert_eq!(
            service.initialize(Vec::new(), members.clone(), 0),
            Err(KeepError::InvalidThreshold)
        );
        assert_eq!(
            service.initialize(Vec::new(), members, 3),
            Err(KeepError::QuorumExceedsSupply {
                quorum: 3,
                supply: U256::from(2),
            })
        );
        assert_eq!(service.quorum().unwrap(), 0);
    }

    #[test]
    fn test_initialize_with_unsorted_signers_leaves_nothing() {
        let (service, _bus) = fresh_service();
        let mut members = addresses(&signers(3));
        members.swap(0, 2);

        assert!(matches!(
            service.initialize(Vec::new(), members.clone(), 2),
            Err(KeepError::InvalidSignature(SignatureRejection::OutOfOrder { .. }))
        ));
        assert_eq!(service.quorum().unwrap(), 0);
        assert!(service.total_supply(execution_id()).unwrap().is_zero());

        // Still initializable afterwards
        members.sort();
        service.initialize(Vec::new(), members, 2).unwrap();
    }

    #[test]
    fn test_initialize_runs_bootstrap_calls() {
        let (service, _bus) = fresh_service();
        let members = signers(1);
        let id = TokenId::from(11);
        let bootstrap = vec![
            self_call(&KeepCall::SetUri {
                id,
                uri: "ipfs://boot".to_string(),
            }),
            sample_call(),
        ];

        service
            .initialize(bootstrap, addresses(&members), 1)
            .unwrap();

        assert_eq!(service.uri(id).unwrap(), "ipfs://boot");
        assert_eq!(service.nonce().unwrap(), 2);
    }

    #[test]
    fn test_receiver_hooks_accept_tokens() {
        let (service, _bus) = fresh_service();
        let (single, batch) = service
            .with_engine(|keep| {
                (
                    keep.on_erc1155_received(Address::ZERO, Address::ZERO, TokenId::one(), U256::one(), &[]),
                    keep.on_erc1155_batch_received(Address::ZERO, Address::ZERO, &[], &[], &[]),
                )
            })
            .unwrap();
        assert_eq!(single, [0xf2, 0x3a, 0x6e, 0x61]);
        assert_eq!(batch, [0xbc, 0x19, 0x7c, 0x81]);
    }
}
