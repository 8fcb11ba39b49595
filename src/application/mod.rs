// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or test-time reporting).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing of progress here (that's Layer 1),
//     except the final metric report, which IS the output
//   - No direct tensor manipulation (that's Layer 5)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Run configuration: YAML file + scale profile
pub mod config;

// The training workflow
pub mod train_use_case;

// The held-out test reporting workflow
pub mod test_use_case;
