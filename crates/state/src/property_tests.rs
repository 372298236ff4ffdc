// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests: last-write-wins per key and enum add/del inversion.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::{StateTree, VarFlags};

#[derive(Debug, Clone)]
enum Op {
    Set(String, String),
    Del(String),
}

fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ups.status".to_string()),
        Just("Battery.Charge".to_string()),
        Just("input.voltage".to_string()),
        Just("output.voltage".to_string()),
        Just("ups.model".to_string()),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (name_strategy(), "[a-zA-Z0-9 .\"\\\\]{0,12}").prop_map(|(n, v)| Op::Set(n, v)),
        name_strategy().prop_map(Op::Del),
    ]
}

proptest! {
    // The observable value per key is the last write, or absent after the
    // matching delete, regardless of traffic on other keys.
    #[test]
    fn last_write_wins(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut tree = StateTree::new();
        let mut model: HashMap<String, String> = HashMap::new();

        for op in &ops {
            match op {
                Op::Set(name, value) => {
                    tree.set_info(name, value);
                    model.insert(name.to_ascii_lowercase(), value.clone());
                }
                Op::Del(name) => {
                    tree.del_info(name);
                    model.remove(&name.to_ascii_lowercase());
                }
            }
        }

        for (lower, value) in &model {
            prop_assert_eq!(tree.get_info(lower), Some(value.as_str()));
        }
        prop_assert_eq!(tree.len(), model.len());
    }

    // add_enum is idempotent; del_enum removes exactly what was added.
    #[test]
    fn enum_add_del_inverse(values in proptest::collection::vec("[a-z]{1,6}", 1..8)) {
        let mut tree = StateTree::new();
        tree.set_info("input.sensitivity", "normal");
        tree.set_flags("input.sensitivity", VarFlags::RW).ok();

        let mut expected: Vec<String> = Vec::new();
        for v in &values {
            let added = tree.add_enum("input.sensitivity", v).ok();
            let fresh = !expected.contains(v);
            prop_assert_eq!(added, Some(fresh));
            if fresh {
                expected.push(v.clone());
            }
        }
        prop_assert_eq!(tree.get("input.sensitivity").map(|v| v.enums().to_vec()),
            Some(expected.clone()));

        for v in &expected {
            prop_assert!(tree.del_enum("input.sensitivity", v));
        }
        prop_assert!(tree.get("input.sensitivity").map_or(false, |v| v.enums().is_empty()));
    }
}
