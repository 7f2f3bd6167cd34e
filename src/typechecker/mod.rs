//! The whole-program type checking pass.
//!
//! One unit is checked in four strict phases: import resolution, struct
//! resolution, function interface resolution, body checking. Each phase
//! aborts on its first error; there is no recovery or continuation.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::ast::{
    Expression, FunctionDecl, Pipeline, PipelineElement, Program, Span, Statement, TypeExpr,
};
use crate::builtins;
use crate::error::{Result, ShoalError};
use crate::parser;
use crate::symbol_table::ScopeTree;
use crate::types::{binary_result, merge, merge_lists, unary_result, Type, TypeList};

/// Whether a construct returns on no, some, or all control paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Completeness {
    No,
    Maybe,
    Yes,
}

/// A fully checked imported unit: its syntax tree plus its populated
/// global scope, used to resolve `alias.member` accesses.
pub struct CheckedUnit {
    pub program: Program,
    pub scope: ScopeTree,
}

enum Callee {
    Function { params: TypeList, returns: TypeList },
    Builtin(&'static builtins::Builtin),
}

/// Per-run state of the on-demand struct resolver.
#[derive(Default)]
struct StructState {
    in_progress: Vec<String>,
    done: HashSet<String>,
}

pub struct Typechecker {
    /// Base directory for import paths.
    search_dir: PathBuf,
    /// Canonical path to checked unit. Append-only during a run; shared
    /// across REPL rounds so a module is parsed and checked once.
    modules: HashMap<String, CheckedUnit>,
    /// Units currently being resolved, for import cycle detection.
    loading: Vec<String>,
}

impl Typechecker {
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: search_dir.into(),
            modules: HashMap::new(),
            loading: Vec::new(),
        }
    }

    /// Checks one unit against (and into) `scope`. The scope may already
    /// carry bindings from earlier rounds; it is seeded with the primitive
    /// typedefs and the builtin registry on first use.
    ///
    /// On success, returns the type list of the unit's result (the merged
    /// type of its top-level returns, or the last statement's type) and
    /// its return completeness.
    pub fn check_program(
        &mut self,
        program: &Program,
        scope: &mut ScopeTree,
    ) -> Result<(TypeList, Completeness)> {
        seed_scope(scope);

        self.resolve_imports(program, scope)?;
        self.resolve_structs(program, scope)?;
        self.resolve_functions(program, scope)?;

        for func in &program.functions {
            self.check_function(func, scope)?;
        }

        // Top-level statements run in the unit scope itself; bindings
        // survive the call so a REPL session can resume from them.
        let mut verdict = Completeness::No;
        let mut agreed = TypeList::new();
        let mut last = TypeList::new();
        for stmt in &program.statements {
            let (tl, c) = self.check_statement(stmt, scope)?;
            if c == Completeness::No {
                last = tl;
                continue;
            }
            if verdict == Completeness::No {
                agreed = tl;
                verdict = c;
            } else {
                agreed = merge_lists(&agreed, &tl, stmt.span())?;
                if c == Completeness::Yes {
                    verdict = Completeness::Yes;
                }
            }
        }

        if verdict == Completeness::No {
            Ok((last, verdict))
        } else {
            Ok((agreed, verdict))
        }
    }

    // Phase 1: imports

    fn resolve_imports(&mut self, program: &Program, scope: &mut ScopeTree) -> Result<()> {
        for import in &program.imports {
            let mut file = self.search_dir.join(&import.path);
            file.set_extension("shoal");
            let canonical = fs::canonicalize(&file).map_err(|e| {
                ShoalError::module_error(
                    import.span,
                    format!("cannot resolve module {}: {}", file.display(), e),
                )
            })?;
            let key = canonical.to_string_lossy().into_owned();

            if self.loading.iter().any(|k| k == &key) {
                return Err(ShoalError::module_error(
                    import.span,
                    format!("circular import of {}", import.path),
                ));
            }

            if !self.modules.contains_key(&key) {
                let source = fs::read_to_string(&canonical).map_err(|e| {
                    ShoalError::module_error(
                        import.span,
                        format!("cannot read module {}: {}", import.path, e),
                    )
                })?;
                let unit = parser::parse(&source)?;
                let mut module_scope = ScopeTree::new();
                self.loading.push(key.clone());
                let checked = self.check_program(&unit, &mut module_scope);
                self.loading.pop();
                checked?;
                debug!("checked module {}", key);
                self.modules.insert(
                    key.clone(),
                    CheckedUnit {
                        program: unit,
                        scope: module_scope,
                    },
                );
            }

            scope.register(&import.alias, Type::Module(key));
        }
        Ok(())
    }

    // Phase 2: structs

    fn resolve_structs(&mut self, program: &Program, scope: &mut ScopeTree) -> Result<()> {
        let mut state = StructState::default();
        for decl in &program.structs {
            self.resolve_struct(&decl.name, program, scope, &mut state)?;
        }
        Ok(())
    }

    fn resolve_struct(
        &mut self,
        name: &str,
        program: &Program,
        scope: &mut ScopeTree,
        state: &mut StructState,
    ) -> Result<Type> {
        let decl = program
            .struct_def(name)
            .unwrap_or_else(|| unreachable!("resolve_struct called for undeclared {}", name));

        if state.done.contains(name) {
            if let Some(Type::Typedef(underlying)) = scope.get(name) {
                return Ok((**underlying).clone());
            }
        }
        if state.in_progress.iter().any(|n| n == name) {
            return Err(ShoalError::resolution_error(
                decl.span,
                format!("recursive struct definition involving {}", name),
            ));
        }
        state.in_progress.push(name.to_string());

        let mut fields: Vec<(String, Type)> = Vec::with_capacity(decl.fields.len());
        for (fname, annotation) in &decl.fields {
            if fields.iter().any(|(existing, _)| existing == fname) {
                return Err(ShoalError::structural_error(
                    decl.span,
                    format!("duplicate field {} in struct {}", fname, name),
                ));
            }
            let ty = self.resolve_field_type(annotation, program, scope, state)?;
            fields.push((fname.clone(), ty));
        }

        state.in_progress.pop();
        state.done.insert(name.to_string());
        let ty = Type::Struct {
            name: name.to_string(),
            fields,
        };
        // Struct names land in the unit-level symbol table as typedefs.
        scope.register(name, Type::Typedef(Box::new(ty.clone())));
        Ok(ty)
    }

    /// Like `resolve_type_expr`, but a name declared as a struct in this
    /// unit resolves on demand, so forward references between structs
    /// work regardless of declaration order.
    fn resolve_field_type(
        &mut self,
        annotation: &TypeExpr,
        program: &Program,
        scope: &mut ScopeTree,
        state: &mut StructState,
    ) -> Result<Type> {
        match annotation {
            TypeExpr::Named { name, .. } if program.struct_def(name).is_some() => {
                self.resolve_struct(name, program, scope, state)
            }
            TypeExpr::Array { element, .. } => Ok(Type::Array(Box::new(
                self.resolve_field_type(element, program, scope, state)?,
            ))),
            _ => self.resolve_type_expr(annotation, scope),
        }
    }

    // Phase 3: function interfaces

    fn resolve_functions(&mut self, program: &Program, scope: &mut ScopeTree) -> Result<()> {
        for func in &program.functions {
            let mut params = TypeList::new();
            for (pname, annotation) in &func.params {
                if func.params.iter().filter(|(n, _)| n == pname).count() > 1 {
                    return Err(ShoalError::structural_error(
                        func.span,
                        format!("duplicate parameter {} in func {}", pname, func.name),
                    ));
                }
                params.push(self.resolve_type_expr(annotation, scope)?);
            }
            let mut returns = TypeList::new();
            for annotation in &func.returns {
                returns.push(self.resolve_type_expr(annotation, scope)?);
            }
            scope.register(&func.name, Type::Function { params, returns });
        }
        Ok(())
    }

    fn resolve_type_expr(&mut self, annotation: &TypeExpr, scope: &ScopeTree) -> Result<Type> {
        match annotation {
            TypeExpr::Named { name, span } => match scope.get(name) {
                Some(Type::Typedef(underlying)) => Ok((**underlying).clone()),
                Some(other) => Err(ShoalError::resolution_error(
                    *span,
                    format!("{} is {}, not a type", name, other),
                )),
                None => Err(ShoalError::resolution_error(
                    *span,
                    format!("unknown type {}", name),
                )),
            },
            TypeExpr::Array { element, .. } => Ok(Type::Array(Box::new(
                self.resolve_type_expr(element, scope)?,
            ))),
            TypeExpr::Qualified { module, name, span } => {
                let path = match scope.get(module) {
                    Some(Type::Module(path)) => path.clone(),
                    Some(other) => {
                        return Err(ShoalError::resolution_error(
                            *span,
                            format!("{} is {}, not a module", module, other),
                        ))
                    }
                    None => {
                        return Err(ShoalError::resolution_error(
                            *span,
                            format!("undefined: {}", module),
                        ))
                    }
                };
                match self.module_binding(&path, name, *span)? {
                    Type::Typedef(underlying) => Ok(*underlying),
                    other => Err(ShoalError::resolution_error(
                        *span,
                        format!("{}.{} is {}, not a type", module, name, other),
                    )),
                }
            }
        }
    }

    // Phase 4: bodies

    fn check_function(&mut self, func: &FunctionDecl, scope: &mut ScopeTree) -> Result<()> {
        let (params, returns) = match scope.get(&func.name) {
            Some(Type::Function { params, returns }) => (params.clone(), returns.clone()),
            _ => {
                return Err(ShoalError::resolution_error(
                    func.span,
                    format!("function {} was not resolved", func.name),
                ))
            }
        };

        let snapshot = scope.take_snapshot();
        for ((pname, _), pty) in func.params.iter().zip(params.iter()) {
            scope.register(pname, pty.clone());
        }
        let checked = self.check_block(&func.body, scope);
        scope.restore_snapshot(snapshot);
        let (body_ty, completeness) = checked?;

        if returns.is_empty() {
            // A bare `return` is fine; returning values is not.
            if completeness != Completeness::No && !body_ty.is_empty() {
                return Err(ShoalError::structural_error(
                    func.span,
                    format!(
                        "func {} declares no return type but returns {} value(s)",
                        func.name,
                        body_ty.len()
                    ),
                ));
            }
        } else {
            if completeness != Completeness::Yes {
                return Err(ShoalError::completeness_error(
                    func.span,
                    format!(
                        "func {} declares a return type but does not return on every path",
                        func.name
                    ),
                ));
            }
            merge_lists(&returns, &body_ty, func.span)?;
        }
        Ok(())
    }

    fn check_block(
        &mut self,
        block: &crate::ast::Block,
        scope: &mut ScopeTree,
    ) -> Result<(TypeList, Completeness)> {
        let snapshot = scope.take_snapshot();
        let result = self.check_statements(&block.statements, scope);
        scope.restore_snapshot(snapshot);
        result
    }

    /// The block combinator: `No` unless some statement returns; all
    /// returning statements must merge to one type list; a `Yes`
    /// statement upgrades the verdict.
    fn check_statements(
        &mut self,
        statements: &[Statement],
        scope: &mut ScopeTree,
    ) -> Result<(TypeList, Completeness)> {
        let mut verdict = Completeness::No;
        let mut agreed = TypeList::new();
        for stmt in statements {
            let (tl, c) = self.check_statement(stmt, scope)?;
            if c == Completeness::No {
                continue;
            }
            if verdict == Completeness::No {
                agreed = tl;
                verdict = c;
            } else {
                agreed = merge_lists(&agreed, &tl, stmt.span())?;
                if c == Completeness::Yes {
                    verdict = Completeness::Yes;
                }
            }
        }
        Ok((agreed, verdict))
    }

    fn check_statement(
        &mut self,
        stmt: &Statement,
        scope: &mut ScopeTree,
    ) -> Result<(TypeList, Completeness)> {
        match stmt {
            Statement::Expression(expr) => {
                let tl = self.check_expression(expr, scope)?;
                Ok((tl, Completeness::No))
            }
            Statement::Let {
                names,
                values,
                span,
            } => {
                let snapshot = scope.take_snapshot();
                match self.check_let(names, values, *span, scope) {
                    Ok(()) => Ok((TypeList::new(), Completeness::No)),
                    Err(e) => {
                        // Unwind every name this let just registered, so a
                        // later reference reports "undefined" rather than
                        // a half-bound type.
                        scope.restore_snapshot(snapshot);
                        Err(e)
                    }
                }
            }
            Statement::Assign {
                targets,
                values,
                span,
            } => {
                let mut lhs = TypeList::new();
                for target in targets {
                    if !is_writable(target, scope) {
                        return Err(ShoalError::writability_error(
                            target.span(),
                            "cannot assign to this expression",
                        ));
                    }
                    lhs.append(self.check_expression(target, scope)?);
                }
                let mut rhs = TypeList::new();
                for value in values {
                    rhs.append(self.check_expression(value, scope)?);
                }
                merge_lists(&lhs, &rhs, *span)?;
                Ok((TypeList::new(), Completeness::No))
            }
            Statement::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                self.check_condition(condition, scope)?;
                let (then_ty, then_c) = self.check_block(then_block, scope)?;
                match else_block {
                    None => {
                        if then_c == Completeness::No {
                            Ok((TypeList::new(), Completeness::No))
                        } else {
                            Ok((then_ty, Completeness::Maybe))
                        }
                    }
                    Some(else_block) => {
                        let (else_ty, else_c) = self.check_block(else_block, scope)?;
                        match (then_c, else_c) {
                            (Completeness::No, Completeness::No) => {
                                Ok((TypeList::new(), Completeness::No))
                            }
                            (Completeness::No, _) => Ok((else_ty, Completeness::Maybe)),
                            (_, Completeness::No) => Ok((then_ty, Completeness::Maybe)),
                            (tc, ec) => {
                                let ty = merge_lists(&then_ty, &else_ty, stmt.span())?;
                                let c = if tc == Completeness::Yes && ec == Completeness::Yes {
                                    Completeness::Yes
                                } else {
                                    Completeness::Maybe
                                };
                                Ok((ty, c))
                            }
                        }
                    }
                }
            }
            Statement::While {
                condition, body, ..
            } => {
                self.check_condition(condition, scope)?;
                let (body_ty, body_c) = self.check_block(body, scope)?;
                if body_c == Completeness::No {
                    Ok((TypeList::new(), Completeness::No))
                } else {
                    // The loop may not execute at all.
                    Ok((body_ty, Completeness::Maybe))
                }
            }
            Statement::Return { values, .. } => {
                let mut tl = TypeList::new();
                for value in values {
                    tl.append(self.check_expression(value, scope)?);
                }
                Ok((tl, Completeness::Yes))
            }
            Statement::Pipeline(pipeline) => {
                let tl = self.check_pipeline(pipeline, scope)?;
                Ok((tl, Completeness::No))
            }
        }
    }

    fn check_condition(&mut self, condition: &Expression, scope: &mut ScopeTree) -> Result<()> {
        let ty = self.check_single(condition, scope)?;
        if !matches!(ty, Type::Boolean) {
            return Err(ShoalError::type_error(
                condition.span(),
                format!("condition must be bool, found {}", ty),
            ));
        }
        Ok(())
    }

    fn check_let(
        &mut self,
        names: &[(String, Option<TypeExpr>)],
        values: &[Expression],
        span: Span,
        scope: &mut ScopeTree,
    ) -> Result<()> {
        for (i, (name, _)) in names.iter().enumerate() {
            if names[..i].iter().any(|(n, _)| n == name) {
                return Err(ShoalError::structural_error(
                    span,
                    format!("duplicate name {} in let", name),
                ));
            }
        }

        let mut rhs = TypeList::new();
        for value in values {
            rhs.append(self.check_expression(value, scope)?);
        }
        if rhs.len() != names.len() {
            return Err(ShoalError::structural_error(
                span,
                format!("let binds {} name(s) but found {} value(s)", names.len(), rhs.len()),
            ));
        }

        for ((name, annotation), inferred) in names.iter().zip(rhs.iter()) {
            let declared = match annotation {
                Some(te) => self.resolve_type_expr(te, scope)?,
                None => Type::Auto,
            };
            let ty = merge(&declared, inferred, span)?;
            if ty.contains_auto() {
                return Err(ShoalError::type_error(
                    span,
                    format!("cannot infer a type for {}", name),
                ));
            }
            if !ty.is_value_type() {
                return Err(ShoalError::type_error(
                    span,
                    format!("cannot bind {} to {}", name, ty),
                ));
            }
            scope.register(name, ty);
        }
        Ok(())
    }

    // Expressions

    /// Checks one expression, yielding its (possibly multi-value) type
    /// list. Deterministic and side-effect-free on success, so re-running
    /// the pass reproduces every type.
    fn check_expression(&mut self, expr: &Expression, scope: &mut ScopeTree) -> Result<TypeList> {
        match expr {
            Expression::IntLiteral { .. } => Ok(TypeList::single(Type::Integer)),
            Expression::FloatLiteral { .. } => Ok(TypeList::single(Type::Float)),
            Expression::BoolLiteral { .. } => Ok(TypeList::single(Type::Boolean)),
            Expression::StrLiteral { .. } => Ok(TypeList::single(Type::Str)),
            Expression::Identifier { name, span } => match scope.get(name) {
                None => Err(ShoalError::resolution_error(
                    *span,
                    format!("undefined: {}", name),
                )),
                Some(ty) if ty.is_value_type() => Ok(TypeList::single(ty.clone())),
                Some(Type::Unknown) => Err(ShoalError::resolution_error(
                    *span,
                    format!("{} was never resolved to a type", name),
                )),
                Some(other) => Err(ShoalError::type_error(
                    *span,
                    format!("{} is {}, not a value", name, other),
                )),
            },
            Expression::Array { elements, .. } => {
                let mut element = Type::Auto;
                for e in elements {
                    let ty = self.check_single(e, scope)?;
                    element = merge(&element, &ty, e.span())?;
                }
                Ok(TypeList::single(Type::Array(Box::new(element))))
            }
            Expression::StructLiteral { name, fields, span } => {
                let declared = match scope.get(name) {
                    Some(Type::Typedef(underlying)) => match (**underlying).clone() {
                        s @ Type::Struct { .. } => s,
                        other => {
                            return Err(ShoalError::type_error(
                                *span,
                                format!("{} is {}, not a struct type", name, other),
                            ))
                        }
                    },
                    Some(other) => {
                        return Err(ShoalError::resolution_error(
                            *span,
                            format!("{} is {}, not a struct type", name, other),
                        ))
                    }
                    None => {
                        return Err(ShoalError::resolution_error(
                            *span,
                            format!("undefined: {}", name),
                        ))
                    }
                };
                let mut literal_fields: Vec<(String, Type)> = Vec::with_capacity(fields.len());
                for (fname, fexpr) in fields {
                    if literal_fields.iter().any(|(existing, _)| existing == fname) {
                        return Err(ShoalError::structural_error(
                            fexpr.span(),
                            format!("duplicate field {} in {} literal", fname, name),
                        ));
                    }
                    let ty = self.check_single(fexpr, scope)?;
                    literal_fields.push((fname.clone(), ty));
                }
                let literal = Type::Struct {
                    name: name.clone(),
                    fields: literal_fields,
                };
                Ok(TypeList::single(merge(&declared, &literal, *span)?))
            }
            Expression::Binary {
                op,
                left,
                right,
                span,
            } => {
                let lhs = self.check_single(left, scope)?;
                let rhs = self.check_single(right, scope)?;
                Ok(TypeList::single(binary_result(*op, &lhs, &rhs, *span)?))
            }
            Expression::Unary { op, operand, span } => {
                let ty = self.check_single(operand, scope)?;
                Ok(TypeList::single(unary_result(*op, &ty, *span)?))
            }
            Expression::Index { base, index, span } => {
                let base_ty = self.check_single(base, scope)?;
                let index_ty = self.check_single(index, scope)?;
                if !matches!(index_ty, Type::Integer) {
                    return Err(ShoalError::type_error(
                        index.span(),
                        format!("index must be int, found {}", index_ty),
                    ));
                }
                match base_ty {
                    Type::Str => Ok(TypeList::single(Type::Str)),
                    Type::Array(element) => Ok(TypeList::single(*element)),
                    other => Err(ShoalError::type_error(
                        *span,
                        format!("cannot index into {}", other),
                    )),
                }
            }
            Expression::Dot { base, field, span } => {
                if let Expression::Identifier { name, .. } = base.as_ref() {
                    if let Some(Type::Module(path)) = scope.get(name) {
                        let path = path.clone();
                        let member = self.module_binding(&path, field, *span)?;
                        return if member.is_value_type() {
                            Ok(TypeList::single(member))
                        } else {
                            Err(ShoalError::type_error(
                                *span,
                                format!("{}.{} is {}, not a value", name, field, member),
                            ))
                        };
                    }
                }
                let base_ty = self.check_single(base, scope)?;
                match base_ty {
                    Type::Struct { name, fields } => fields
                        .iter()
                        .find(|(fname, _)| fname == field)
                        .map(|(_, ty)| TypeList::single(ty.clone()))
                        .ok_or_else(|| {
                            ShoalError::resolution_error(
                                *span,
                                format!("struct {} has no field {}", name, field),
                            )
                        }),
                    other => Err(ShoalError::type_error(
                        *span,
                        format!("cannot access field {} on {}", field, other),
                    )),
                }
            }
            Expression::Call { callee, args, span } => {
                let mut arg_types = TypeList::new();
                for arg in args {
                    arg_types.append(self.check_expression(arg, scope)?);
                }
                match self.resolve_callee(callee, scope)? {
                    Callee::Builtin(builtin) => (builtin.check)(&arg_types, *span),
                    Callee::Function { params, returns } => {
                        if params.len() != arg_types.len() {
                            return Err(ShoalError::structural_error(
                                *span,
                                format!(
                                    "expected {} argument(s), found {}",
                                    params.len(),
                                    arg_types.len()
                                ),
                            ));
                        }
                        merge_lists(&params, &arg_types, *span)?;
                        Ok(returns)
                    }
                }
            }
            Expression::ProcessCall { args, .. } => {
                for arg in args {
                    let ty = self.check_single(arg, scope)?;
                    if !matches!(ty, Type::Str) {
                        return Err(ShoalError::type_error(
                            arg.span(),
                            format!("process arguments must be str, found {}", ty),
                        ));
                    }
                }
                // A process yields its exit code.
                Ok(TypeList::single(Type::Integer))
            }
        }
    }

    fn check_single(&mut self, expr: &Expression, scope: &mut ScopeTree) -> Result<Type> {
        let tl = self.check_expression(expr, scope)?;
        match tl.as_single() {
            Some(ty) => Ok(ty.clone()),
            None => Err(ShoalError::structural_error(
                expr.span(),
                format!("expected a single value, found {}", tl.len()),
            )),
        }
    }

    /// Resolves a call target to exactly one function or builtin.
    fn resolve_callee(&mut self, callee: &Expression, scope: &ScopeTree) -> Result<Callee> {
        match callee {
            Expression::Identifier { name, span } => match scope.get(name) {
                Some(Type::Function { params, returns }) => Ok(Callee::Function {
                    params: params.clone(),
                    returns: returns.clone(),
                }),
                Some(Type::Builtin(bname)) => builtins::lookup(bname)
                    .map(Callee::Builtin)
                    .ok_or_else(|| {
                        ShoalError::resolution_error(
                            *span,
                            format!("builtin {} has no checking rule", bname),
                        )
                    }),
                Some(Type::Typedef(_)) => Err(ShoalError::type_error(
                    *span,
                    format!("cannot call type {}", name),
                )),
                Some(other) => Err(ShoalError::type_error(
                    *span,
                    format!("{} is {}, not a function", name, other),
                )),
                None => Err(ShoalError::resolution_error(
                    *span,
                    format!("undefined: {}", name),
                )),
            },
            Expression::Dot { base, field, span } => {
                let module = match base.as_ref() {
                    Expression::Identifier { name, .. } => match scope.get(name) {
                        Some(Type::Module(path)) => path.clone(),
                        _ => {
                            return Err(ShoalError::type_error(
                                *span,
                                "only module members can be called through a dot".to_string(),
                            ))
                        }
                    },
                    _ => {
                        return Err(ShoalError::type_error(
                            *span,
                            "only module members can be called through a dot".to_string(),
                        ))
                    }
                };
                match self.module_binding(&module, field, *span)? {
                    Type::Function { params, returns } => Ok(Callee::Function { params, returns }),
                    Type::Builtin(bname) => builtins::lookup(&bname)
                        .map(Callee::Builtin)
                        .ok_or_else(|| {
                            ShoalError::resolution_error(
                                *span,
                                format!("builtin {} has no checking rule", bname),
                            )
                        }),
                    other => Err(ShoalError::type_error(
                        *span,
                        format!("{} is {}, not a function", field, other),
                    )),
                }
            }
            other => Err(ShoalError::type_error(
                other.span(),
                "this expression is not callable".to_string(),
            )),
        }
    }

    fn module_binding(&self, path: &str, member: &str, span: Span) -> Result<Type> {
        let unit = self.modules.get(path).ok_or_else(|| {
            ShoalError::module_error(span, format!("module {} is not loaded", path))
        })?;
        unit.scope.get(member).cloned().ok_or_else(|| {
            ShoalError::resolution_error(span, format!("module has no member {}", member))
        })
    }

    // Pipelines

    /// Pipeline typing: the first element is a `str` source or a process
    /// call, every interior element is a process call, and the last is a
    /// process call, a writable one-or-two `str` sink, or a pipeline-local
    /// `let` that captures output into fresh `str` variables. The pipeline
    /// itself types as `int`, the chain's exit code.
    fn check_pipeline(&mut self, pipeline: &Pipeline, scope: &mut ScopeTree) -> Result<TypeList> {
        let snapshot = scope.take_snapshot();
        let result = self.check_pipeline_elements(pipeline, scope);
        if result.is_err() {
            // Drop anything a pipeline-local let pre-registered.
            scope.restore_snapshot(snapshot);
        }
        result
    }

    fn check_pipeline_elements(
        &mut self,
        pipeline: &Pipeline,
        scope: &mut ScopeTree,
    ) -> Result<TypeList> {
        let count = pipeline.elements.len();
        for (i, element) in pipeline.elements.iter().enumerate() {
            let is_last = i + 1 == count;
            match element {
                PipelineElement::Exprs { exprs, span } => {
                    if i == 0 {
                        let source = single_element(exprs, *span, "pipeline source")?;
                        if matches!(source, Expression::ProcessCall { .. }) {
                            self.check_expression(source, scope)?;
                        } else {
                            let ty = self.check_single(source, scope)?;
                            if !matches!(ty, Type::Str) {
                                return Err(ShoalError::type_error(
                                    source.span(),
                                    format!("pipeline input must be str, found {}", ty),
                                ));
                            }
                        }
                    } else if !is_last {
                        let stage = single_element(exprs, *span, "pipeline stage")?;
                        if !matches!(stage, Expression::ProcessCall { .. }) {
                            return Err(ShoalError::type_error(
                                stage.span(),
                                "pipeline stages must be process calls".to_string(),
                            ));
                        }
                        self.check_expression(stage, scope)?;
                    } else if exprs.len() == 1
                        && matches!(exprs[0], Expression::ProcessCall { .. })
                    {
                        self.check_expression(&exprs[0], scope)?;
                    } else {
                        // A sink: one or two writable str lvalues.
                        if exprs.is_empty() || exprs.len() > 2 {
                            return Err(ShoalError::structural_error(
                                *span,
                                format!(
                                    "pipeline sink expects one or two targets, found {}",
                                    exprs.len()
                                ),
                            ));
                        }
                        for target in exprs {
                            if !is_writable(target, scope) {
                                return Err(ShoalError::writability_error(
                                    target.span(),
                                    "pipeline sink must be assignable",
                                ));
                            }
                            let ty = self.check_single(target, scope)?;
                            if !matches!(ty, Type::Str) {
                                return Err(ShoalError::type_error(
                                    target.span(),
                                    format!("pipeline sink must be str, found {}", ty),
                                ));
                            }
                        }
                    }
                }
                PipelineElement::Let { names, span } => {
                    if !is_last {
                        return Err(ShoalError::structural_error(
                            *span,
                            "pipeline capture must be the last element".to_string(),
                        ));
                    }
                    // Register first: a failed pipeline rolls these back.
                    for name in names {
                        scope.register(name, Type::Str);
                    }
                    if names.is_empty() || names.len() > 2 {
                        return Err(ShoalError::structural_error(
                            *span,
                            format!(
                                "pipeline capture expects one or two names, found {}",
                                names.len()
                            ),
                        ));
                    }
                    for (i, name) in names.iter().enumerate() {
                        if names[..i].contains(name) {
                            return Err(ShoalError::structural_error(
                                *span,
                                format!("duplicate name {} in pipeline capture", name),
                            ));
                        }
                    }
                }
            }
        }
        Ok(TypeList::single(Type::Integer))
    }
}

fn single_element<'e>(
    exprs: &'e [Expression],
    span: Span,
    what: &str,
) -> Result<&'e Expression> {
    if exprs.len() == 1 {
        Ok(&exprs[0])
    } else {
        Err(ShoalError::structural_error(
            span,
            format!("{} must be a single expression", what),
        ))
    }
}

/// Writability: plain identifiers bound to value types are writable, index
/// and dot access inherit from their base, everything else is not.
fn is_writable(expr: &Expression, scope: &ScopeTree) -> bool {
    match expr {
        Expression::Identifier { name, .. } => {
            scope.get(name).map(Type::is_value_type).unwrap_or(false)
        }
        Expression::Index { base, .. } | Expression::Dot { base, .. } => is_writable(base, scope),
        _ => false,
    }
}

/// Primitive typedefs and the builtin registry, registered once per
/// session at the bottom of the unit scope.
fn seed_scope(scope: &mut ScopeTree) {
    if scope.contains("int") {
        return;
    }
    scope.register("int", Type::Typedef(Box::new(Type::Integer)));
    scope.register("float", Type::Typedef(Box::new(Type::Float)));
    scope.register("bool", Type::Typedef(Box::new(Type::Boolean)));
    scope.register("str", Type::Typedef(Box::new(Type::Str)));
    for builtin in builtins::BUILTINS {
        scope.register(builtin.name, Type::Builtin(builtin.name.to_string()));
    }
}
