use super::source_location::Span;
use super::statement::{Block, Statement};
use super::types::TypeExpr;

/// `import "lib/strings" as strs`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Path as written, without the `.shoal` extension.
    pub path: String,
    pub alias: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<(String, TypeExpr)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<(String, TypeExpr)>,
    pub returns: Vec<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

/// One source unit: the main file or an imported module. Struct and
/// function declarations keep their insertion order; forward references
/// between them are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub imports: Vec<ImportDecl>,
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn struct_def(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn function_def(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}
