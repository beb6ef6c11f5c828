//! Name tables used while compiling a condition.
//!
//! A scope maps lower-cased variable and function names to what they resolve
//! to. Variables either fold to a constant at compile time or read a field of
//! the subject at evaluation time.

use std::f32::consts::PI;

use rustc_hash::FxHashMap;

use crate::expression::parser::{Builtin, SubjectVar};
use crate::expression::value::Value;
use crate::resources::resourcekey::ResourceKey;
use crate::resources::tags::TagVocabulary;

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Constant(Value),
    Subject(SubjectVar),
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionScope {
    variables: FxHashMap<String, Binding>,
    functions: FxHashMap<String, Builtin>,
}

impl ExpressionScope {
    /// Scope with only the math builtins and `TRUE`/`FALSE`/`PI`.
    pub fn new() -> Self {
        let mut scope = Self::default();
        scope.define_constant("true", Value::TRUE);
        scope.define_constant("false", Value::FALSE);
        scope.define_constant("pi", Value::Number(PI));
        for (name, builtin) in [
            ("not", Builtin::Not),
            ("if", Builtin::If),
            ("min", Builtin::Min),
            ("max", Builtin::Max),
            ("abs", Builtin::Abs),
            ("floor", Builtin::Floor),
            ("ceiling", Builtin::Ceiling),
            ("round", Builtin::Round),
            ("sqrt", Builtin::Sqrt),
        ] {
            scope.define_function(name, builtin);
        }
        scope
    }

    /// The region scope: `biome.*` attributes, one `biome.is<Tag>` per tag in
    /// `tags`, and a `biomeType.<path>` constant for every region key.
    pub fn standard<'a>(
        tags: &TagVocabulary,
        regions: impl IntoIterator<Item = &'a ResourceKey>,
    ) -> Self {
        let mut scope = Self::new();
        for (name, var) in [
            ("biome.name", SubjectVar::Name),
            ("biome.id", SubjectVar::Key),
            ("biome.modid", SubjectVar::Namespace),
            ("biome.rainfall", SubjectVar::Rainfall),
            ("biome.temperature", SubjectVar::Temperature),
            ("biome.humidity", SubjectVar::Humidity),
            ("biome.isfake", SubjectVar::IsFake),
        ] {
            scope.define_subject(name, var);
        }
        for (id, tag) in tags.iter() {
            scope.define_subject(&format!("biome.is{tag}"), SubjectVar::Tag(id));
        }
        for key in regions {
            scope.define_constant(
                &format!("biometype.{}", key.path()),
                Value::text(key.to_string()),
            );
        }
        scope.define_function("biome.islike", Builtin::IsLike);
        scope.define_function("islike", Builtin::IsLike);
        scope
    }

    pub fn define_constant(&mut self, name: &str, value: Value) {
        self.variables
            .insert(name.to_ascii_lowercase(), Binding::Constant(value));
    }

    pub fn define_subject(&mut self, name: &str, var: SubjectVar) {
        self.variables
            .insert(name.to_ascii_lowercase(), Binding::Subject(var));
    }

    pub fn define_function(&mut self, name: &str, builtin: Builtin) {
        self.functions.insert(name.to_ascii_lowercase(), builtin);
    }

    pub fn variable(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name.to_ascii_lowercase().as_str())
    }

    pub fn function(&self, name: &str) -> Option<Builtin> {
        self.functions.get(name.to_ascii_lowercase().as_str()).copied()
    }
}
