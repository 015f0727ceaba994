pub mod rewrite;

/// An instruction for the generation engine, split so that directives and
/// user-supplied content travel in separate fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Directives: role, tone, rules.
    pub system: String,
    /// User content only, enclosed in boundary markers.
    pub user: String,
}

impl Prompt {
    /// Flatten into a single instruction, for engines without a system field.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}
