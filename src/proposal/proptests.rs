//! Property-based tests for proposal encoding
//!
//! - Whitelist calldata: layout is fully determined by the token count
//! - Whitelist calldata: decodes back to (yip210 × n, max × n, tokens)
//! - Selectors: `full_calldata` is always selector ++ args

use super::actions::whitelist_withdrawals;
use super::ProposalAction;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolValue;
use proptest::prelude::*;

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from)
}

proptest! {
    /// Property: three dynamic arrays of n words encode to 3 heads + 3 × (len + n) words
    #[test]
    fn whitelist_calldata_length(
        reserves in arb_address(),
        yip210 in arb_address(),
        tokens in prop::collection::vec(arb_address(), 0..12),
    ) {
        let action = whitelist_withdrawals(reserves, yip210, &tokens);
        let n = tokens.len();
        prop_assert_eq!(action.calldata.len(), 32 * (3 + 3 * (1 + n)));
    }

    /// Property: decoding the arguments recovers exactly what was encoded
    #[test]
    fn whitelist_calldata_decodes(
        reserves in arb_address(),
        yip210 in arb_address(),
        tokens in prop::collection::vec(arb_address(), 1..8),
    ) {
        let action = whitelist_withdrawals(reserves, yip210, &tokens);
        let (whos, amounts, decoded_tokens) =
            <(Vec<Address>, Vec<U256>, Vec<Address>)>::abi_decode_params(&action.calldata)
                .unwrap();

        prop_assert_eq!(whos, vec![yip210; tokens.len()]);
        prop_assert_eq!(amounts, vec![U256::MAX; tokens.len()]);
        prop_assert_eq!(decoded_tokens, tokens);
        prop_assert_eq!(action.target, reserves);
    }

    /// Property: full calldata is selector followed by the raw arguments
    #[test]
    fn full_calldata_is_selector_plus_args(
        target in arb_address(),
        name in "[a-zA-Z_][a-zA-Z0-9_]{0,20}",
        args in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let signature = format!("{}()", name);
        let action =
            ProposalAction::new(target, U256::ZERO, signature, Bytes::from(args.clone())).unwrap();
        let full = action.full_calldata();
        let selector = action.selector();

        prop_assert_eq!(full.len(), 4 + args.len());
        prop_assert_eq!(&full[..4], selector.as_slice());
        prop_assert_eq!(&full[4..], args.as_slice());
    }
}
