/// Handle to a code blob registered with the code runner.
pub type CodeHandle = u32;

/// Interface to the external code compiler/runner.
///
/// The loader registers every source blob it encounters (script bodies,
/// trigger conditions, event action parameters, creation code) and compiles
/// them all in the post-load pass. What the runner does with them afterwards
/// is its own business.
pub trait CodeRegistry {
    /// Registers a runnable code blob and returns its handle.
    fn register(&mut self, source: &[u8]) -> CodeHandle;

    /// Registers a boolean-expression blob, as used by trigger conditions and
    /// question actions.
    fn register_question(&mut self, source: &[u8]) -> CodeHandle;

    /// Compiles a previously registered blob. The error string is the
    /// runner's diagnostic, passed through to the load failure.
    fn compile(&mut self, handle: CodeHandle) -> Result<(), String>;
}
