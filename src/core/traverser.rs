//! Resolution-aware traversal of one Python syntax tree.
//!
//! A single depth-first walk emits declaration nodes and import, inheritance
//! and call edges into a [`GraphModel`] while tracking the enclosing class and
//! function, the unit's import aliases and the inferred types of instance
//! attributes. Call targets are best-effort hypotheses: a resolved call is
//! emitted both in its qualified and in its bare form.

use tracing::debug;
use tree_sitter::Node as TSNode;

use super::graph::{GraphModel, NodeAttributes, NodeKind, Relation, BASE_CLASSES, PARAMETERS};
use super::resolver::{
    classify_callee, classify_value, last_segment, self_attribute, AttributeTypePolicy,
    ClassFrame, Parameter, ResolutionState,
};
use crate::error::{AnalysisError, Result};
use crate::parsers::common::{find_child_by_kind, first_error_position, line_of};

const INITIALIZER: &str = "__init__";

pub struct Traverser<'m> {
    unit_id: String,
    model: &'m mut GraphModel,
    state: ResolutionState,
}

impl<'m> Traverser<'m> {
    pub fn new(unit_id: impl Into<String>, model: &'m mut GraphModel) -> Self {
        Self::with_policy(unit_id, model, AttributeTypePolicy::default())
    }

    pub fn with_policy(
        unit_id: impl Into<String>,
        model: &'m mut GraphModel,
        policy: AttributeTypePolicy,
    ) -> Self {
        Self {
            unit_id: unit_id.into(),
            model,
            state: ResolutionState::new(policy),
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Walk the tree rooted at `root`. `source` is the text the tree was parsed from.
    pub fn visit(&mut self, root: TSNode, source: &[u8]) -> Result<()> {
        if root.has_error() {
            let message = match first_error_position(&root) {
                Some((line, column)) => format!("syntax tree has errors (line {line}, column {column})"),
                None => "syntax tree has errors".to_string(),
            };
            return Err(AnalysisError::traversal(self.unit_id.as_str(), message));
        }

        let (nodes_before, edges_before) = (self.model.nodes().len(), self.model.edges().len());
        let mut pending = vec![Step::Visit(root)];
        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(node) => self.visit_node(node, source, &mut pending)?,
                Step::LeaveClass(frame) => self.state.exit_class(frame),
                Step::LeaveFunction(previous) => self.state.exit_function(previous),
            }
        }
        debug!(
            unit = %self.unit_id,
            nodes = self.model.nodes().len() - nodes_before,
            edges = self.model.edges().len() - edges_before,
            aliases = self.state.aliases.len(),
            "traversed unit"
        );
        Ok(())
    }

    fn visit_node<'t>(
        &mut self,
        node: TSNode<'t>,
        source: &[u8],
        pending: &mut Vec<Step<'t>>,
    ) -> Result<()> {
        if node.is_error() || node.is_missing() {
            return Err(self.failure(&node, "unexpected syntax error node"));
        }

        match node.kind() {
            "import_statement" => self.visit_import(node, source),
            "import_from_statement" => self.visit_import_from(node, source),
            "future_import_statement" => self.visit_future_import(node, source),
            "class_definition" => self.visit_class(node, Vec::new(), source, pending),
            "function_definition" => self.visit_function(node, Vec::new(), source, pending),
            "decorated_definition" => self.visit_decorated(node, source, pending),
            "assignment" => {
                self.visit_assignment(node, source);
                schedule_children(node, pending);
                Ok(())
            }
            "call" => {
                self.visit_call(node, source);
                schedule_children(node, pending);
                Ok(())
            }
            _ => {
                schedule_children(node, pending);
                Ok(())
            }
        }
    }

    /// `import a.b.c` binds `c`; `import a.b as x` binds `x`.
    fn visit_import(&mut self, node: TSNode, source: &[u8]) -> Result<()> {
        let line = line_of(&node);
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let (module, local) = match child.kind() {
                "dotted_name" => {
                    let module = self.dotted_path(&child, source)?;
                    let local = last_segment(&module).to_string();
                    (module, local)
                }
                "aliased_import" => {
                    let name = self.field(&child, "name")?;
                    let alias = self.field(&child, "alias")?;
                    (self.dotted_path(&name, source)?, self.text(&alias, source)?.to_string())
                }
                _ => continue,
            };

            self.state.aliases.bind(local, module.as_str());
            self.emit(Relation::Imports, self.unit_id.clone(), module, line);
        }
        Ok(())
    }

    fn visit_import_from(&mut self, node: TSNode, source: &[u8]) -> Result<()> {
        let module_node = self.field(&node, "module_name")?;
        let module = match module_node.kind() {
            // `from . import x` has no module path and binds nothing.
            "relative_import" => match find_child_by_kind(&module_node, "dotted_name") {
                Some(dotted) => self.dotted_path(&dotted, source)?,
                None => return Ok(()),
            },
            _ => self.dotted_path(&module_node, source)?,
        };

        self.bind_imported_names(&node, module_node.end_byte(), &module, source)
    }

    fn visit_future_import(&mut self, node: TSNode, source: &[u8]) -> Result<()> {
        // `__future__` itself is an anonymous token; the names follow `import`.
        let after = find_child_by_kind(&node, "import")
            .map_or(node.start_byte(), |keyword| keyword.end_byte());
        self.bind_imported_names(&node, after, "__future__", source)
    }

    /// Handle the imported names of a from-import appearing after byte `after`.
    fn bind_imported_names(
        &mut self,
        node: &TSNode,
        after: usize,
        module: &str,
        source: &[u8],
    ) -> Result<()> {
        let line = line_of(node);
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.start_byte() < after {
                continue;
            }
            let (name, local) = match child.kind() {
                "dotted_name" => {
                    let name = self.dotted_path(&child, source)?;
                    (name.clone(), name)
                }
                "aliased_import" => {
                    let name = self.field(&child, "name")?;
                    let alias = self.field(&child, "alias")?;
                    (self.dotted_path(&name, source)?, self.text(&alias, source)?.to_string())
                }
                "wildcard_import" => ("*".to_string(), "*".to_string()),
                _ => continue,
            };

            let full_path = format!("{module}.{name}");
            self.state.aliases.bind(local, full_path.as_str());
            self.emit(Relation::Imports, self.unit_id.clone(), full_path, line);
            self.emit(Relation::Imports, self.unit_id.clone(), name, line);
        }
        Ok(())
    }

    fn visit_decorated<'t>(
        &mut self,
        node: TSNode<'t>,
        source: &[u8],
        pending: &mut Vec<Step<'t>>,
    ) -> Result<()> {
        let mut cursor = node.walk();
        let decorators: Vec<TSNode<'t>> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .collect();

        let definition = self.field(&node, "definition")?;
        match definition.kind() {
            "class_definition" => self.visit_class(definition, decorators, source, pending),
            "function_definition" => self.visit_function(definition, decorators, source, pending),
            _ => {
                schedule_children(node, pending);
                Ok(())
            }
        }
    }

    fn visit_class<'t>(
        &mut self,
        node: TSNode<'t>,
        decorators: Vec<TSNode<'t>>,
        source: &[u8],
        pending: &mut Vec<Step<'t>>,
    ) -> Result<()> {
        let name = self.text(&self.field(&node, "name")?, source)?;
        let qualified_name = self.state.class_qualified_name(name);
        let line = line_of(&node);

        let mut base_classes = Vec::new();
        let mut inherited = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                match base.kind() {
                    "keyword_argument" | "dictionary_splat" | "comment" => {}
                    "identifier" => {
                        let base_name = self.text(&base, source)?.to_string();
                        inherited.push(base_name.clone());
                        base_classes.push(base_name);
                    }
                    _ => base_classes.push(self.text(&base, source)?.to_string()),
                }
            }
        }

        let mut attributes = NodeAttributes::new();
        attributes.insert(BASE_CLASSES.to_string(), base_classes);
        self.model.append_node(
            NodeKind::Class,
            qualified_name.as_str(),
            self.unit_id.as_str(),
            line,
            attributes,
        );
        for base in inherited {
            self.emit(Relation::Inherits, qualified_name.clone(), base, line);
        }

        let frame = self.state.enter_class(qualified_name);
        pending.push(Step::LeaveClass(frame));
        schedule_scope(node, decorators, None, pending);
        Ok(())
    }

    fn visit_function<'t>(
        &mut self,
        node: TSNode<'t>,
        decorators: Vec<TSNode<'t>>,
        source: &[u8],
        pending: &mut Vec<Step<'t>>,
    ) -> Result<()> {
        let name = self.text(&self.field(&node, "name")?, source)?;
        let qualified_name = self.state.function_qualified_name(name);
        let in_class = self.state.enclosing_class().is_some();
        let kind = if in_class {
            NodeKind::Method
        } else {
            NodeKind::Function
        };

        let parameters = match node.child_by_field_name("parameters") {
            Some(parameters) => self.collect_parameters(&parameters, source)?,
            None => Vec::new(),
        };

        let mut attributes = NodeAttributes::new();
        attributes.insert(
            PARAMETERS.to_string(),
            parameters.iter().map(|p| p.name.clone()).collect(),
        );
        self.model.append_node(
            kind,
            qualified_name.as_str(),
            self.unit_id.as_str(),
            line_of(&node),
            attributes,
        );

        if in_class && name == INITIALIZER {
            self.state.seed_initializer_parameters(&parameters);
        }

        let previous = self.state.enter_function(qualified_name);
        pending.push(Step::LeaveFunction(previous));
        let return_type = node.child_by_field_name("return_type");
        schedule_scope(node, decorators, return_type, pending);
        Ok(())
    }

    /// Positional parameters in declaration order, up to the first `*`,
    /// `*args` or `**kwargs`.
    fn collect_parameters(&self, parameters: &TSNode, source: &[u8]) -> Result<Vec<Parameter>> {
        let mut collected = Vec::new();
        let mut cursor = parameters.walk();
        for child in parameters.children(&mut cursor) {
            let parameter = match child.kind() {
                "identifier" => Parameter {
                    name: self.text(&child, source)?.to_string(),
                    annotation: None,
                },
                "default_parameter" => Parameter {
                    name: self.text(&self.field(&child, "name")?, source)?.to_string(),
                    annotation: None,
                },
                "typed_parameter" => {
                    let Some(name) = child.named_child(0).filter(|n| n.kind() == "identifier")
                    else {
                        // Typed `*args: T` or `**kwargs: T`.
                        break;
                    };
                    Parameter {
                        name: self.text(&name, source)?.to_string(),
                        annotation: self.simple_annotation(&child, source)?,
                    }
                }
                "typed_default_parameter" => Parameter {
                    name: self.text(&self.field(&child, "name")?, source)?.to_string(),
                    annotation: self.simple_annotation(&child, source)?,
                },
                "list_splat_pattern" | "dictionary_splat_pattern" | "keyword_separator" | "*" => {
                    break
                }
                _ => continue,
            };
            collected.push(parameter);
        }
        Ok(collected)
    }

    /// Annotation text when the `type` field is a single identifier.
    fn simple_annotation(&self, parameter: &TSNode, source: &[u8]) -> Result<Option<String>> {
        let Some(annotation) = parameter.child_by_field_name("type") else {
            return Ok(None);
        };
        let inner = if annotation.kind() == "type" && annotation.named_child_count() == 1 {
            annotation.named_child(0)
        } else {
            Some(annotation)
        };

        match inner {
            Some(identifier) if identifier.kind() == "identifier" => {
                Ok(Some(self.text(&identifier, source)?.to_string()))
            }
            _ => Ok(None),
        }
    }

    /// `self.X = Name(...)` or `self.X = known_name` record a type for `X`.
    fn visit_assignment(&mut self, node: TSNode, source: &[u8]) {
        // Only the first target of a chained assignment is considered, and
        // annotated assignments are not inferred from.
        if node.parent().is_some_and(|parent| parent.kind() == "assignment")
            || node.child_by_field_name("type").is_some()
        {
            return;
        }

        let Some(attribute) = node
            .child_by_field_name("left")
            .and_then(|left| self_attribute(&left, source))
        else {
            return;
        };

        let Some(mut value) = node.child_by_field_name("right") else {
            return;
        };
        while value.kind() == "assignment" {
            match value.child_by_field_name("right") {
                Some(inner) => value = inner,
                None => return,
            }
        }

        self.state.infer_assignment(attribute, classify_value(&value, source));
    }

    fn visit_call(&mut self, node: TSNode, source: &[u8]) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };

        let targets = self.state.call_targets(classify_callee(&function, source));
        let caller = self.state.observation_source(&self.unit_id).to_string();
        let line = line_of(&node);
        for target in targets {
            self.emit(Relation::Calls, caller.clone(), target, line);
        }
    }

    fn emit(&mut self, relation: Relation, source: String, target: String, line: usize) {
        self.model
            .append_edge(source, target, relation, self.unit_id.as_str(), Some(line));
    }

    /// Dotted name with any interior whitespace or comments dropped.
    fn dotted_path(&self, node: &TSNode, source: &[u8]) -> Result<String> {
        if node.kind() != "dotted_name" {
            return Ok(self.text(node, source)?.to_string());
        }

        let mut segments = Vec::new();
        let mut cursor = node.walk();
        for segment in node.named_children(&mut cursor) {
            if segment.kind() == "identifier" {
                segments.push(self.text(&segment, source)?);
            }
        }
        Ok(segments.join("."))
    }

    fn field<'t>(&self, node: &TSNode<'t>, name: &str) -> Result<TSNode<'t>> {
        node.child_by_field_name(name).ok_or_else(|| {
            self.failure(node, &format!("`{}` without a `{name}` field", node.kind()))
        })
    }

    fn text<'s>(&self, node: &TSNode, source: &'s [u8]) -> Result<&'s str> {
        node.utf8_text(source)
            .map_err(|err| self.failure(node, &format!("invalid UTF-8 in source text: {err}")))
    }

    fn failure(&self, node: &TSNode, message: &str) -> AnalysisError {
        AnalysisError::traversal(
            self.unit_id.as_str(),
            format!("{message} at line {}", line_of(node)),
        )
    }
}

/// Pending work of the depth-first walk. A scope's exit is queued beneath its
/// body, so the resolution state unwinds once everything inside was visited.
enum Step<'t> {
    Visit(TSNode<'t>),
    LeaveClass(ClassFrame),
    LeaveFunction(Option<String>),
}

/// Queue the named children of `node` so they pop in source order.
fn schedule_children<'t>(node: TSNode<'t>, pending: &mut Vec<Step<'t>>) {
    let mut cursor = node.walk();
    let children: Vec<TSNode<'t>> = node.named_children(&mut cursor).collect();
    pending.extend(children.into_iter().rev().map(Step::Visit));
}

/// Queue a declaration's scope: its children (bases or parameters, then the
/// body), then its decorators, then `trailing`.
fn schedule_scope<'t>(
    node: TSNode<'t>,
    decorators: Vec<TSNode<'t>>,
    trailing: Option<TSNode<'t>>,
    pending: &mut Vec<Step<'t>>,
) {
    pending.extend(trailing.map(Step::Visit));
    pending.extend(decorators.into_iter().rev().map(Step::Visit));

    let mut cursor = node.walk();
    let children: Vec<TSNode<'t>> = node
        .named_children(&mut cursor)
        .filter(|child| Some(*child) != trailing)
        .collect();
    pending.extend(children.into_iter().rev().map(Step::Visit));
}
