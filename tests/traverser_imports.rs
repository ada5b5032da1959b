use impactgraph::core::{GraphModel, Relation, Traverser};
use impactgraph::parsers::python::PythonParser;

fn traverse(unit_id: &str, source: &str) -> GraphModel {
    let unit = PythonParser::new()
        .unwrap()
        .parse_source(unit_id, source.to_string())
        .unwrap();
    let mut model = GraphModel::new();
    Traverser::new(unit_id, &mut model)
        .visit(unit.root(), unit.source_bytes())
        .unwrap();
    model
}

fn imports(model: &GraphModel) -> Vec<(&str, &str)> {
    model
        .edges()
        .iter()
        .filter(|e| e.relation == Relation::Imports)
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect()
}

#[test]
fn plain_import_emits_one_edge_from_the_unit() {
    let model = traverse("app.py", "import os\n");

    assert!(model.nodes().is_empty());
    assert_eq!(imports(&model), vec![("app.py", "os")]);
    assert_eq!(model.edges()[0].source_unit, "app.py");
    assert_eq!(model.edges()[0].source_line, Some(1));
}

#[test]
fn dotted_and_aliased_imports_keep_the_full_module_path() {
    let model = traverse("app.py", "import os.path\nimport numpy as np, json\n");

    assert_eq!(
        imports(&model),
        vec![("app.py", "os.path"), ("app.py", "numpy"), ("app.py", "json")]
    );
}

#[test]
fn from_import_emits_qualified_then_bare() {
    let model = traverse("app.py", "from pkg import Thing as T\n");

    assert_eq!(
        imports(&model),
        vec![("app.py", "pkg.Thing"), ("app.py", "Thing")]
    );
}

#[test]
fn from_import_with_several_names() {
    let source = "from services.email import (\n    EmailSender,\n    render as render_mail,\n)\n";
    let model = traverse("app.py", source);

    assert_eq!(
        imports(&model),
        vec![
            ("app.py", "services.email.EmailSender"),
            ("app.py", "EmailSender"),
            ("app.py", "services.email.render"),
            ("app.py", "render"),
        ]
    );
    assert!(model.edges().iter().all(|e| e.source_line == Some(1)));
}

#[test]
fn relative_imports() {
    let model = traverse(
        "pkg/app.py",
        "from . import sibling\nfrom .models import User\nfrom ..core.db import Session\n",
    );

    // A bare `from .` has no module path and yields nothing.
    assert_eq!(
        imports(&model),
        vec![
            ("pkg/app.py", "models.User"),
            ("pkg/app.py", "User"),
            ("pkg/app.py", "core.db.Session"),
            ("pkg/app.py", "Session"),
        ]
    );
}

#[test]
fn wildcard_import() {
    let model = traverse("app.py", "from os.path import *\n");

    assert_eq!(
        imports(&model),
        vec![("app.py", "os.path.*"), ("app.py", "*")]
    );
}

#[test]
fn future_import_is_an_ordinary_from_import() {
    let model = traverse("app.py", "from __future__ import annotations\n");

    assert_eq!(
        imports(&model),
        vec![("app.py", "__future__.annotations"), ("app.py", "annotations")]
    );
}

#[test]
fn imports_inside_functions_still_come_from_the_unit() {
    let source = "def load():\n    import json\n    return json.loads('{}')\n";
    let model = traverse("app.py", source);

    assert_eq!(imports(&model), vec![("app.py", "json")]);
    assert_eq!(model.edges()[0].source_line, Some(2));
}

#[test]
fn aliases_are_bound_for_the_rest_of_the_unit() {
    let source = "import numpy as np\nfrom pkg import Thing as T, other\n";
    let unit = PythonParser::new()
        .unwrap()
        .parse_source("app.py", source.to_string())
        .unwrap();
    let mut model = GraphModel::new();
    let mut traverser = Traverser::new("app.py", &mut model);
    traverser.visit(unit.root(), unit.source_bytes()).unwrap();

    let aliases = &traverser.state().aliases;
    assert_eq!(aliases.len(), 3);
    assert_eq!(aliases.resolve("np"), Some("numpy"));
    assert_eq!(aliases.resolve("T"), Some("pkg.Thing"));
    assert_eq!(aliases.imported_type("T"), Some("Thing"));
    assert_eq!(aliases.resolve("other"), Some("pkg.other"));
    assert_eq!(aliases.resolve("Thing"), None);
}
