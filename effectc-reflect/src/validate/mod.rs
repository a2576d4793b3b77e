use crate::diagnostics::{DiagnosticSink, ErrorCounter};
use crate::reflect::EffectClass;
use effectc_common::map::FastHashSet;
use effectc_syntax::{SourceLocation, SymbolResolver, TypeDecl};
use log::info;

mod body;
mod construct;
mod declaration;

pub use construct::ConstructKind;

/// State shared by all validation rules of one effect.
pub(crate) struct Context<'a> {
    pub decl: &'a TypeDecl,
    pub effect: &'a EffectClass,
    pub resolver: &'a dyn SymbolResolver,
    pub sink: &'a dyn DiagnosticSink,
}

impl<'a> Context<'a> {
    /// Names parameters and locals may not shadow: effect fields and system constants.
    pub fn member_names(&self) -> FastHashSet<&'a str> {
        let system_constants = self
            .effect
            .constant_buffers
            .iter()
            .filter(|b| b.shared)
            .flat_map(|b| b.constants.iter().map(|c| c.name.as_str()));
        self.decl
            .fields()
            .map(|f| f.name.as_str())
            .chain(system_constants)
            .collect()
    }

    pub fn error(&self, location: SourceLocation, message: String) {
        self.sink.error(location, message)
    }

    pub fn warning(&self, location: SourceLocation, message: String) {
        self.sink.warning(location, message)
    }
}

/// Validate an effect declaration against its built model.
///
/// Every rule runs to completion, so all problems of the effect are reported in one pass.
/// Returns `true` if no errors were reported. Warnings never fail validation.
pub fn validate_effect(
    decl: &TypeDecl,
    effect: &EffectClass,
    resolver: &dyn SymbolResolver,
    sink: &dyn DiagnosticSink,
) -> bool {
    let counter = ErrorCounter::new(sink);
    let cx = Context {
        decl,
        effect,
        resolver,
        sink: &counter,
    };

    declaration::check_declaration(&cx);
    declaration::check_names(&cx);
    declaration::check_literals(&cx);
    declaration::check_methods(&cx);
    declaration::check_usage(&cx);
    for method in &effect.methods {
        body::check_body(&cx, method);
    }

    info!(
        "validated effect {}: {} error(s)",
        effect.name,
        counter.errors()
    );
    counter.errors() == 0
}
