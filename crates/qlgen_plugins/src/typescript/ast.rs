//! graphql-js compatible `DocumentNode` JSON.

use graphql_parser::query::{self as q, Number, Type, TypeCondition};
use qlgen_schema::{FragmentDefinition, Operation, SelectionSet};
use serde_json::{json, Map, Value};

type Directive = q::Directive<'static, String>;
type GqlValue = q::Value<'static, String>;

pub fn document(definitions: Vec<Value>) -> Value {
    json!({ "kind": "Document", "definitions": definitions })
}

pub fn operation(op: &Operation<'_>) -> Value {
    let mut node = Map::new();
    node.insert("kind".into(), json!("OperationDefinition"));
    node.insert("operation".into(), json!(op.kind.keyword()));
    if let Some(name) = op.name {
        node.insert("name".into(), name_node(name));
    }
    let variables: Vec<Value> = op
        .variables
        .iter()
        .map(|v| {
            let mut var = Map::new();
            var.insert("kind".into(), json!("VariableDefinition"));
            var.insert(
                "variable".into(),
                json!({ "kind": "Variable", "name": name_node(&v.name) }),
            );
            var.insert("type".into(), type_node(&v.var_type));
            if let Some(default) = &v.default_value {
                var.insert("defaultValue".into(), value_node(default));
            }
            var.insert("directives".into(), json!([]));
            Value::Object(var)
        })
        .collect();
    node.insert("variableDefinitions".into(), Value::Array(variables));
    node.insert("directives".into(), directives(op.directives));
    node.insert("selectionSet".into(), selection_set(op.selection_set));
    Value::Object(node)
}

pub fn fragment(fragment: &FragmentDefinition) -> Value {
    let TypeCondition::On(condition) = &fragment.type_condition;
    json!({
        "kind": "FragmentDefinition",
        "name": name_node(&fragment.name),
        "typeCondition": named_type(condition),
        "directives": directives(&fragment.directives),
        "selectionSet": selection_set(&fragment.selection_set),
    })
}

fn name_node(value: &str) -> Value {
    json!({ "kind": "Name", "value": value })
}

fn named_type(name: &str) -> Value {
    json!({ "kind": "NamedType", "name": name_node(name) })
}

fn type_node(ty: &Type<'static, String>) -> Value {
    match ty {
        Type::NamedType(name) => named_type(name),
        Type::ListType(inner) => json!({ "kind": "ListType", "type": type_node(inner) }),
        Type::NonNullType(inner) => json!({ "kind": "NonNullType", "type": type_node(inner) }),
    }
}

fn directives(directives: &[Directive]) -> Value {
    directives
        .iter()
        .map(|d| {
            json!({
                "kind": "Directive",
                "name": name_node(&d.name),
                "arguments": arguments(&d.arguments),
            })
        })
        .collect()
}

fn arguments(arguments: &[(String, GqlValue)]) -> Value {
    arguments
        .iter()
        .map(|(name, value)| {
            json!({ "kind": "Argument", "name": name_node(name), "value": value_node(value) })
        })
        .collect()
}

fn number(number: &Number) -> String {
    number
        .as_i64()
        .map_or_else(|| "0".to_string(), |n| n.to_string())
}

fn value_node(value: &GqlValue) -> Value {
    match value {
        GqlValue::Variable(name) => json!({ "kind": "Variable", "name": name_node(name) }),
        GqlValue::Int(n) => json!({ "kind": "IntValue", "value": number(n) }),
        GqlValue::Float(f) => json!({ "kind": "FloatValue", "value": f.to_string() }),
        GqlValue::String(s) => json!({ "kind": "StringValue", "value": s, "block": false }),
        GqlValue::Boolean(b) => json!({ "kind": "BooleanValue", "value": b }),
        GqlValue::Null => json!({ "kind": "NullValue" }),
        GqlValue::Enum(name) => json!({ "kind": "EnumValue", "value": name }),
        GqlValue::List(items) => {
            let values: Vec<Value> = items.iter().map(value_node).collect();
            json!({ "kind": "ListValue", "values": values })
        }
        GqlValue::Object(fields) => {
            let fields: Vec<Value> = fields
                .iter()
                .map(|(name, value)| {
                    json!({ "kind": "ObjectField", "name": name_node(name), "value": value_node(value) })
                })
                .collect();
            json!({ "kind": "ObjectValue", "fields": fields })
        }
    }
}

fn selection_set(set: &SelectionSet) -> Value {
    let selections: Vec<Value> = set
        .items
        .iter()
        .map(|selection| match selection {
            q::Selection::Field(field) => {
                let mut node = Map::new();
                node.insert("kind".into(), json!("Field"));
                if let Some(alias) = &field.alias {
                    node.insert("alias".into(), name_node(alias));
                }
                node.insert("name".into(), name_node(&field.name));
                node.insert("arguments".into(), arguments(&field.arguments));
                node.insert("directives".into(), directives(&field.directives));
                if !field.selection_set.items.is_empty() {
                    node.insert("selectionSet".into(), selection_set(&field.selection_set));
                }
                Value::Object(node)
            }
            q::Selection::FragmentSpread(spread) => json!({
                "kind": "FragmentSpread",
                "name": name_node(&spread.fragment_name),
                "directives": directives(&spread.directives),
            }),
            q::Selection::InlineFragment(inline) => {
                let mut node = Map::new();
                node.insert("kind".into(), json!("InlineFragment"));
                if let Some(TypeCondition::On(condition)) = &inline.type_condition {
                    node.insert("typeCondition".into(), named_type(condition));
                }
                node.insert("directives".into(), directives(&inline.directives));
                node.insert("selectionSet".into(), selection_set(&inline.selection_set));
                Value::Object(node)
            }
        })
        .collect();
    json!({ "kind": "SelectionSet", "selections": selections })
}
