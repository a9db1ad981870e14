//! List messages command implementation.

use oca_hooks_core::RuleDescriptor;

/// Prints `:id: description` for every active message.
pub fn print(descriptors: &[RuleDescriptor]) {
    for d in descriptors {
        println!(":{}: {}", d.id, d.description);
    }
}
