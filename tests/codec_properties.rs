//! Property-based tests for the box codec.

use std::collections::BTreeMap;

use ampframe::{AmpBox, codec};
use ampframe_testing::box_bytes;
use proptest::prelude::*;

fn pairs() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[_a-z][_a-z0-9]{0,15}", "\\PC{0,32}", 0..12)
}

proptest! {
    #[test]
    fn serialize_then_deserialize_is_identity(map in pairs()) {
        let ampbox: AmpBox = map.into_iter().collect();
        let wire = codec::serialize(&ampbox).expect("serialize");
        prop_assert_eq!(codec::deserialize(&wire).expect("deserialize"), ampbox);
    }

    #[test]
    fn frame_order_on_the_wire_does_not_matter(map in pairs()) {
        let mut reversed: Vec<(&str, &str)> =
            map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        reversed.reverse();
        let decoded = codec::deserialize(&box_bytes(&reversed)).expect("deserialize");
        let expected: AmpBox = map.clone().into_iter().collect();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn ask_leads_whenever_present(map in pairs(), ask in any::<u64>()) {
        let mut ampbox: AmpBox = map.into_iter().collect();
        let ask = ask.to_string();
        ampbox.insert("_ask", ask.clone());
        let wire = codec::serialize(&ampbox).expect("serialize");
        let expected = box_bytes(&[("_ask", ask.as_str())]);
        let prefix = &expected[..expected.len() - 2];
        prop_assert_eq!(&wire[..prefix.len()], prefix);
    }
}
