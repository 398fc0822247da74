use anyhow::Result;
use reed_frontend::ast::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Wat,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub format: TargetFormat,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self.format {
            TargetFormat::Wat => "wasm32-wat",
        }
    }
}

/// A backend renders one annotated program into assembly text.
pub trait CodeGenerator {
    fn target(&self) -> &Target;
    fn generate(&mut self, program: &Program) -> Result<String>;
}
