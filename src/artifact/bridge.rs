// Bridge method detection
//
// A synthetic method that does nothing but forward to one other method is a
// bridge for it when the compiler marked it `ACC_BRIDGE`, or when its
// signature only differs from the target by types the target specializes.

use super::classfile::{object_type_name, MethodDescriptor, MethodInfo, ParsedClass};
use super::inheritance::InheritanceIndex;
use super::MemberKey;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Build the accessed -> bridge relation for every class in the artifact
pub fn find_bridges(
    classes: &[ParsedClass],
    inheritance: &InheritanceIndex,
) -> HashMap<MemberKey, MemberKey> {
    let mut accessed_to_bridge = HashMap::new();

    for class in classes {
        for method in class.methods.iter().filter(|m| m.access.is_synthetic()) {
            let Some(accessed) = forwarded_target(method) else {
                continue;
            };

            if method.access.is_bridge() || is_potential_bridge(method, &accessed, inheritance) {
                let bridge = MemberKey::method(&class.name, &method.name, &method.descriptor);
                debug!("Bridge {} -> {}", bridge, accessed);
                accessed_to_bridge.insert(accessed, bridge);
            }
        }
    }

    accessed_to_bridge
}

/// The single method a body calls, if it calls exactly one distinct method
fn forwarded_target(method: &MethodInfo) -> Option<MemberKey> {
    let distinct: HashSet<_> = method.invoked.iter().collect();
    if distinct.len() != 1 {
        return None;
    }
    distinct
        .into_iter()
        .next()
        .map(|target| MemberKey::method(&target.owner, &target.name, &target.descriptor))
}

fn is_potential_bridge(
    bridge: &MethodInfo,
    accessed: &MemberKey,
    inheritance: &InheritanceIndex,
) -> bool {
    // Only inheritable methods can bridge
    if bridge.access.is_private() || bridge.access.is_final() || bridge.access.is_static() {
        return false;
    }

    let (Ok(bridge_desc), Some(Ok(accessed_desc))) = (
        MethodDescriptor::parse(&bridge.descriptor),
        accessed.descriptor.as_deref().map(MethodDescriptor::parse),
    ) else {
        return false;
    };

    if bridge_desc.arguments.len() != accessed_desc.arguments.len() {
        return false;
    }

    bridge_desc
        .arguments
        .iter()
        .zip(&accessed_desc.arguments)
        .all(|(b, a)| is_bridge_compatible(b, a, inheritance))
        && is_bridge_compatible(
            &bridge_desc.return_type,
            &accessed_desc.return_type,
            inheritance,
        )
}

fn is_bridge_compatible(bridge: &str, accessed: &str, inheritance: &InheritanceIndex) -> bool {
    if bridge == accessed {
        return true;
    }

    match (object_type_name(bridge), object_type_name(accessed)) {
        (Some(bridge_type), Some(accessed_type)) => {
            inheritance.ancestors(accessed_type).contains(bridge_type)
        }
        _ => false,
    }
}
