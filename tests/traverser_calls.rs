use impactgraph::core::{GraphModel, Relation, Traverser};
use impactgraph::parsers::python::PythonParser;

fn traverse(source: &str) -> GraphModel {
    let unit = PythonParser::new()
        .unwrap()
        .parse_source("svc.py", source.to_string())
        .unwrap();
    let mut model = GraphModel::new();
    Traverser::new("svc.py", &mut model)
        .visit(unit.root(), unit.source_bytes())
        .unwrap();
    model
}

fn calls(model: &GraphModel) -> Vec<(&str, &str)> {
    model
        .edges()
        .iter()
        .filter(|e| e.relation == Relation::Calls)
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect()
}

#[test]
fn annotated_initializer_parameter_resolves_attribute_calls() {
    let source = r#"
from db import DatabaseConnection


class Svc:
    def __init__(self, db: DatabaseConnection):
        self.db = db

    def m(self):
        self.db.insert(1)
"#;
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![("Svc.m", "DatabaseConnection.insert"), ("Svc.m", "insert")]
    );
    let insert = model
        .edges()
        .iter()
        .find(|e| e.target == "insert")
        .unwrap();
    assert_eq!(insert.source_line, Some(10));
}

#[test]
fn constructor_assignment_resolves_attribute_calls() {
    let source = r#"
from services.email import EmailSender


class UserService:
    def __init__(self):
        self.email_sender = EmailSender()

    def register(self, address):
        self.email_sender.send_welcome_email(address)
"#;
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("UserService.__init__", "services.email.EmailSender"),
            ("UserService.__init__", "EmailSender"),
            ("UserService.register", "EmailSender.send_welcome_email"),
            ("UserService.register", "send_welcome_email"),
        ]
    );
}

#[test]
fn type_only_flows_from_imported_classes() {
    let source = r#"
class Local:
    pass


class Svc:
    def __init__(self, other: Local):
        self.local = Local()
        self.other = other

    def run(self):
        self.local.go()
        self.other.go()
"#;
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("Svc.__init__", "Local"),
            ("Svc.run", "go"),
            ("Svc.run", "go"),
        ]
    );
}

#[test]
fn aliased_function_call_emits_both_hypotheses() {
    let source = "from pkg import helper\n\ndef run():\n    helper()\n";
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![("run", "pkg.helper"), ("run", "helper")]
    );
}

#[test]
fn import_alias_resolves_to_the_imported_path() {
    let source = "from pkg import Thing as T\nimport a.b.c\n\nT()\nc()\n";
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("svc.py", "pkg.Thing"),
            ("svc.py", "T"),
            ("svc.py", "a.b.c"),
            ("svc.py", "c"),
        ]
    );
}

#[test]
fn plain_module_import_is_not_duplicated() {
    let source = "import os\n\nos()\n";
    let model = traverse(source);

    assert_eq!(calls(&model), vec![("svc.py", "os")]);
}

#[test]
fn self_method_call_is_bare_only() {
    let source = r#"
class Repo:
    def save(self):
        pass

    def flush(self):
        self.save()
"#;
    let model = traverse(source);

    assert_eq!(calls(&model), vec![("Repo.flush", "save")]);
}

#[test]
fn deeper_chains_and_other_receivers_fall_back_to_the_method_name() {
    let source = r#"
from db import DatabaseConnection


class Svc:
    def __init__(self, db: DatabaseConnection):
        self.db = db

    def run(self, other):
        self.db.pool.acquire()
        other.db.insert()
        np.array([1, 2])
        handlers[0]()
"#;
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("Svc.run", "acquire"),
            ("Svc.run", "insert"),
            ("Svc.run", "array"),
        ]
    );
}

#[test]
fn call_sources_follow_the_innermost_scope() {
    let source = r#"
setup()


class Config:
    defaults = load_defaults()

    def reload(self):
        refresh()


def main():
    def inner():
        nested()
    run()
"#;
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("svc.py", "setup"),
            ("Config", "load_defaults"),
            ("Config.reload", "refresh"),
            ("main.inner", "nested"),
            ("main", "run"),
        ]
    );
}

#[test]
fn nested_calls_are_emitted_outer_first() {
    let source = "def main():\n    service = UserService(DatabaseConnection())\n    service.create_user(\"ada\")\n";
    let model = traverse(source);

    assert_eq!(
        calls(&model),
        vec![
            ("main", "UserService"),
            ("main", "DatabaseConnection"),
            ("main", "create_user"),
        ]
    );
}

#[test]
fn chained_and_annotated_assignments() {
    let source = r#"
from mail import Sender, Queue


class Svc:
    def __init__(self):
        self.a = self.b = Sender()
        self.q: Queue = Queue()

    def run(self):
        self.a.send()
        self.b.send()
        self.q.push()
"#;
    let model = traverse(source);

    let run_calls: Vec<_> = calls(&model)
        .into_iter()
        .filter(|(src, _)| *src == "Svc.run")
        .map(|(_, target)| target)
        .collect();
    // Only the first target of a chain is inferred; annotated targets never are.
    assert_eq!(run_calls, vec!["Sender.send", "send", "send", "push"]);
}

#[test]
fn attribute_types_propagate_between_attributes() {
    let source = r#"
from db import Pool


class Svc:
    def __init__(self):
        self.pool = Pool()
        self.backup = pool

    def run(self):
        self.backup.drain()
"#;
    let model = traverse(source);

    // Name propagation looks the right-hand name up in the attribute table.
    assert!(calls(&model).contains(&("Svc.run", "Pool.drain")));
}
