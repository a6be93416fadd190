//! Integration tests for include resolution

use pretty_assertions::assert_eq;

use sql_include::{
    Document, ElementBuilder, ErrorKind, Fragment, FragmentStore, IncludeError, IncludeResolver,
    MapperNamespace, MissingPolicy, NodeId, PlaceholderConfig, PlaceholderError, PropertyParser,
    Resolution, ResolverConfig, VariableContext,
};

fn sql(id: &str) -> ElementBuilder {
    ElementBuilder::new("sql").attr("id", id)
}

fn include(refid: &str) -> ElementBuilder {
    ElementBuilder::new("include").attr("refid", refid)
}

fn property(name: &str, value: &str) -> ElementBuilder {
    ElementBuilder::new("property")
        .attr("name", name)
        .attr("value", value)
}

/// Mapper fixture: fragments registered under the `users` namespace
struct Mapper {
    fragments: FragmentStore,
    namespace: MapperNamespace,
    parser: PropertyParser,
    globals: VariableContext,
}

impl Mapper {
    fn new() -> Self {
        Self {
            fragments: FragmentStore::new(),
            namespace: MapperNamespace::new("users"),
            parser: PropertyParser::default(),
            globals: VariableContext::new(),
        }
    }

    fn fragment(mut self, id: &str, builder: ElementBuilder) -> Self {
        self.fragments
            .insert(format!("users.{}", id), Fragment::from_builder(builder))
            .expect("Should register");
        self
    }

    fn globals(mut self, globals: VariableContext) -> Self {
        self.globals = globals;
        self
    }

    fn resolver(&self) -> IncludeResolver<'_> {
        IncludeResolver::new(&self.fragments, &self.namespace, &self.parser)
            .with_globals(self.globals.clone())
    }

    fn resolve(&self, statement: ElementBuilder) -> Result<(Document, NodeId, Resolution), IncludeError> {
        let (mut doc, node) = Document::with_root_element(statement);
        let resolution = self.resolver().resolve_includes(&mut doc, node)?;
        Ok((doc, node, resolution))
    }

    fn render(&self, statement: ElementBuilder) -> String {
        let (doc, node, resolution) = self.resolve(statement).expect("Should resolve");
        assert_eq!(resolution, Resolution::Complete);
        doc.render(node).unwrap()
    }
}

fn no_includes_left(doc: &Document, node: NodeId) -> bool {
    doc.descendants(node)
        .unwrap()
        .into_iter()
        .all(|n| !doc.is_element(n, "include").unwrap())
}

#[test]
fn test_tree_without_includes_unchanged() {
    let mapper = Mapper::new().globals(VariableContext::from_iter([("x", "1")]));
    let statement = ElementBuilder::new("select")
        .attr("id", "find")
        .text("select * from t where a = ${x}")
        .child(
            ElementBuilder::new("where")
                .child(ElementBuilder::new("if").attr("test", "${x}").text("and b = 1")),
        )
        .cdata("c < 1")
        .comment(" trailing ");

    let (original, original_node) = Document::with_root_element(statement.clone());
    assert_eq!(
        mapper.render(statement),
        original.render(original_node).unwrap()
    );
}

#[test]
fn test_resolving_expanded_tree_again_is_noop() {
    let mapper = Mapper::new().fragment("cols", sql("cols").text("id, ${c}"));
    let (mut doc, node, _) = mapper
        .resolve(
            ElementBuilder::new("select")
                .child(include("cols").child(property("c", "name"))),
        )
        .unwrap();
    let first = doc.render(node).unwrap();

    let again = mapper.resolver().resolve_includes(&mut doc, node).unwrap();
    assert_eq!(again, Resolution::Complete);
    assert_eq!(doc.render(node).unwrap(), first);
}

#[test]
fn test_no_include_remains_at_any_depth() {
    let mapper = Mapper::new()
        .fragment("inner", sql("inner").text("1"))
        .fragment(
            "outer",
            sql("outer").child(ElementBuilder::new("if").child(include("inner"))),
        );
    let (doc, node, resolution) = mapper
        .resolve(
            ElementBuilder::new("select").child(
                ElementBuilder::new("where")
                    .child(ElementBuilder::new("trim").child(include("outer"))),
            ),
        )
        .unwrap();

    assert!(resolution.is_complete());
    assert!(no_includes_left(&doc, node));
    assert_eq!(
        doc.render(node).unwrap(),
        "<select><where><trim><if>1</if></trim></where></select>"
    );
}

#[test]
fn test_splicing_preserves_order() {
    let mapper = Mapper::new().fragment(
        "F",
        sql("F")
            .child(ElementBuilder::new("x"))
            .child(ElementBuilder::new("y")),
    );
    assert_eq!(
        mapper.render(
            ElementBuilder::new("select")
                .child(ElementBuilder::new("a"))
                .child(include("F"))
                .child(ElementBuilder::new("b"))
        ),
        "<select><a/><x/><y/><b/></select>"
    );
}

#[test]
fn test_nested_fragments_resolve_inside_out() {
    let mapper = Mapper::new()
        .fragment("F2", sql("F2").text("${table}.${column}"))
        .fragment(
            "F1",
            sql("F1")
                .text("where ")
                .child(include("F2").child(property("column", "id")))
                .text(" = 1"),
        );
    assert_eq!(
        mapper.render(
            ElementBuilder::new("select")
                .text("select * from users ")
                .child(include("F1").child(property("table", "u")))
        ),
        "<select>select * from users where u.id = 1</select>"
    );
}

#[test]
fn test_sibling_site_context_does_not_leak() {
    let mapper = Mapper::new().fragment("F", sql("F").text("[${v}]"));
    assert_eq!(
        mapper.render(
            ElementBuilder::new("select")
                .child(include("F").child(property("v", "first")))
                .child(include("F"))
        ),
        "<select>[first][${v}]</select>"
    );
}

#[test]
fn test_inner_site_overrides_outer_without_leaking_back() {
    let mapper = Mapper::new()
        .fragment("leaf", sql("leaf").text("${v}"))
        .fragment(
            "wrap",
            sql("wrap")
                .child(include("leaf").child(property("v", "inner")))
                .text("/${v}"),
        );
    assert_eq!(
        mapper.render(ElementBuilder::new("select").child(include("wrap").child(property("v", "outer")))),
        "<select>inner/outer</select>"
    );
}

#[test]
fn test_declared_value_references_inherited_variable() {
    let mapper = Mapper::new()
        .globals(VariableContext::from_iter([("schema", "app")]))
        .fragment("from", sql("from").text("from ${table}"));
    assert_eq!(
        mapper.render(
            ElementBuilder::new("select").child(include("from").child(property("table", "${schema}.users")))
        ),
        "<select>from app.users</select>"
    );
}

#[test]
fn test_global_variables_substitute_inside_fragments_only() {
    let mapper = Mapper::new()
        .globals(VariableContext::from_iter([("schema", "app")]))
        .fragment("from", sql("from").text("from ${schema}.users"));
    assert_eq!(
        mapper.render(ElementBuilder::new("select").text("${schema} ").child(include("from"))),
        "<select>${schema} from app.users</select>"
    );
}

#[test]
fn test_cross_namespace_reference() {
    let mut fragments = FragmentStore::new();
    fragments
        .insert("common.paging", Fragment::from_builder(sql("paging").text("limit 10")))
        .unwrap();
    let namespace = MapperNamespace::new("users");
    let parser = PropertyParser::default();
    let resolver = IncludeResolver::new(&fragments, &namespace, &parser);

    let (mut doc, node) = Document::with_root_element(
        ElementBuilder::new("select")
            .text("select 1 ")
            .child(include("common.paging")),
    );
    assert!(resolver.resolve_includes(&mut doc, node).unwrap().is_complete());
    assert_eq!(doc.render(node).unwrap(), "<select>select 1 limit 10</select>");
}

#[test]
fn test_resolving_whole_document_from_root() {
    let mapper = Mapper::new().fragment("cols", sql("cols").text("id"));
    let (mut doc, _) = Document::with_root_element(ElementBuilder::new("select").child(include("cols")));
    let root = doc.root();
    ElementBuilder::new("update")
        .child(include("cols"))
        .append_to(&mut doc, root)
        .unwrap();

    let resolution = mapper.resolver().resolve_includes(&mut doc, root).unwrap();
    assert!(resolution.is_complete());
    assert_eq!(
        doc.render(root).unwrap(),
        "<select>id</select><update>id</update>"
    );
}

#[test]
fn test_missing_fragment_is_deferred_not_fatal() {
    let mapper = Mapper::new();
    let (_, _, resolution) = mapper
        .resolve(ElementBuilder::new("select").child(include("later")))
        .expect("Missing fragments are not errors");
    match resolution {
        Resolution::Deferred(missing) => {
            assert_eq!(missing.refid, "users.later");
            assert_eq!(missing.kind(), ErrorKind::Deferred);
            insta::assert_snapshot!(
                missing.to_string(),
                @"could not find SQL fragment to include with refid 'users.later'"
            );
        }
        Resolution::Complete => panic!("Expected Deferred"),
    }
}

#[test]
fn test_missing_nested_fragment_is_deferred() {
    let mapper = Mapper::new().fragment("outer", sql("outer").child(include("inner")));
    let (_, _, resolution) = mapper
        .resolve(ElementBuilder::new("select").child(include("outer")))
        .unwrap();
    assert!(matches!(resolution, Resolution::Deferred(ref m) if m.refid == "users.inner"));
}

#[test]
fn test_duplicate_variable_is_fatal() {
    let mapper = Mapper::new().fragment("F", sql("F").text("${x}"));
    let err = mapper
        .resolve(
            ElementBuilder::new("select").child(
                include("F")
                    .child(property("x", "same"))
                    .child(property("x", "same")),
            ),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Fatal);
    assert!(matches!(err, IncludeError::DuplicateVariable { ref name } if name == "x"));
    insta::assert_snapshot!(
        err.to_string(),
        @"variable 'x' defined twice in the same include definition"
    );
}

#[test]
fn test_malformed_include_is_fatal() {
    let mapper = Mapper::new();
    let err = mapper
        .resolve(ElementBuilder::new("select").child(ElementBuilder::new("include").attr("ref", "F")))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Fatal);
    insta::assert_snapshot!(
        err.to_string(),
        @"malformed include: include element is missing its refid attribute"
    );
}

#[test]
fn test_cycle_is_reported() {
    let mapper = Mapper::new()
        .fragment("a", sql("a").child(include("b")))
        .fragment("b", sql("b").child(include("a")));
    let err = mapper
        .resolve(ElementBuilder::new("select").child(include("a")))
        .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"circular include detected: users.a -> users.b -> users.a"
    );
}

#[test]
fn test_strict_placeholders_propagate_errors() {
    let mut mapper = Mapper::new().fragment("F", sql("F").text("${undefined}"));
    mapper.parser =
        PropertyParser::new(PlaceholderConfig::new().with_missing_policy(MissingPolicy::Fail));
    // Substitution only runs with a non-empty context
    mapper.globals = VariableContext::from_iter([("x", "1")]);

    let err = mapper
        .resolve(ElementBuilder::new("select").child(include("F")))
        .unwrap_err();
    assert!(matches!(
        err,
        IncludeError::Placeholder(PlaceholderError::Undefined { ref key }) if key == "undefined"
    ));
}

#[test]
fn test_unset_namespace_propagates() {
    let fragments = FragmentStore::new();
    let namespace = MapperNamespace::unset();
    let parser = PropertyParser::default();
    let resolver = IncludeResolver::new(&fragments, &namespace, &parser);
    let (mut doc, node) = Document::with_root_element(ElementBuilder::new("select").child(include("F")));
    let err = resolver.resolve_includes(&mut doc, node).unwrap_err();
    assert!(matches!(err, IncludeError::Namespace(_)));
}

#[test]
fn test_resolver_from_config() {
    let config = ResolverConfig::from_str(
        r#"
[variables]
alias = "u"

[placeholder]
enable_default_value = true
"#,
    )
    .unwrap();
    let mut fragments = FragmentStore::new();
    fragments
        .insert(
            "users.cols",
            Fragment::from_builder(sql("cols").text("${alias}.id, ${alias}.${extra:name}")),
        )
        .unwrap();
    let namespace = MapperNamespace::new("users");
    // with_config applies globals and depth only; placeholder options come
    // from the parser built out of the same config
    let parser = config.property_parser();
    let resolver = IncludeResolver::new(&fragments, &namespace, &parser).with_config(&config);

    let (mut doc, node) = Document::with_root_element(ElementBuilder::new("select").child(include("cols")));
    assert!(resolver.resolve_includes(&mut doc, node).unwrap().is_complete());
    assert_eq!(doc.render(node).unwrap(), "<select>u.id, u.name</select>");
}
