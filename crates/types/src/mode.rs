/// Guest privilege level, fixed for the lifetime of one run.
///
/// Guest workloads conventionally run in user mode, where the CSR space is
/// fully virtualized away. Supervisor mode exists so that code which would
/// genuinely depend on CSR side effects is refused instead of silently
/// miscomputing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivilegeMode {
    #[default]
    User,
    Supervisor,
}
