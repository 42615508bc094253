//! Workspace root package; exists to host shared dev tooling (git hooks).

#![forbid(unsafe_code)]
