//! OpenAPI 3.1 document for the generated collection routes, built with utoipa's builders.

use crate::config::{EntityDescriptor, FieldDef, FieldDefault, FieldType};
use crate::routes::CollectionsRouter;
use crate::schema::Schema;
use utoipa::openapi::content::ContentBuilder;
use utoipa::openapi::path::{HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::{Response, ResponseBuilder};
use utoipa::openapi::schema::{ArrayBuilder, Object, ObjectBuilder, SchemaFormat, SchemaType, Type};
use utoipa::openapi::tag::TagBuilder;
use utoipa::openapi::{ComponentsBuilder, InfoBuilder, OpenApi, OpenApiBuilder, Paths, Ref, Required};

const ERROR_SCHEMA: &str = "ErrorDetail";
const MESSAGE_SCHEMA: &str = "Message";

fn field_type(ty: FieldType) -> Type {
    match ty {
        FieldType::Integer => Type::Integer,
        FieldType::Float => Type::Number,
        FieldType::Text => Type::String,
        FieldType::Boolean => Type::Boolean,
        FieldType::Timestamp => Type::String,
    }
}

fn field_schema(field: &FieldDef) -> Object {
    let ty = field_type(field.ty);
    let mut builder = ObjectBuilder::new().schema_type(if field.nullable {
        SchemaType::Array(vec![ty, Type::Null])
    } else {
        SchemaType::Type(ty)
    });
    if field.ty == FieldType::Timestamp {
        builder = builder.format(Some(SchemaFormat::Custom("date-time".into())));
    }
    if let Some(FieldDefault::Value(v)) = &field.default {
        if !v.is_null() {
            builder = builder.default(Some(v.clone()));
        }
    }
    builder.build()
}

/// Component schema for a derived input or output schema. Fields without a default are required.
pub fn schema_object(schema: &Schema) -> Object {
    let mut builder = ObjectBuilder::new()
        .schema_type(Type::Object)
        .title(Some(schema.name()));
    for field in schema.fields() {
        builder = builder.property(field.name.as_str(), field_schema(field));
        if field.is_required() {
            builder = builder.required(field.name.as_str());
        }
    }
    builder.build()
}

fn json_response(description: &str, schema_name: &str) -> Response {
    ResponseBuilder::new()
        .description(description)
        .content(
            "application/json",
            ContentBuilder::new()
                .schema(Some(Ref::from_schema_name(schema_name)))
                .build(),
        )
        .build()
}

fn id_parameter() -> Parameter {
    ParameterBuilder::new()
        .name("id")
        .parameter_in(ParameterIn::Path)
        .required(Required::True)
        .schema(Some(ObjectBuilder::new().schema_type(Type::Integer).build()))
        .build()
}

fn filter_parameters(entity: &EntityDescriptor) -> Vec<Parameter> {
    entity
        .output_schema()
        .fields()
        .iter()
        .map(|f| {
            ParameterBuilder::new()
                .name(f.name.as_str())
                .parameter_in(ParameterIn::Query)
                .required(Required::False)
                .description(Some(format!("Only records whose {} equals this value", f.name)))
                .schema(Some(field_schema(f)))
                .build()
        })
        .collect()
}

fn operation(tags: &[String], operation_id: String, summary: String) -> OperationBuilder {
    let mut builder = OperationBuilder::new()
        .operation_id(Some(operation_id))
        .summary(Some(summary));
    for tag in tags {
        builder = builder.tag(tag.as_str());
    }
    builder
}

fn with_body(builder: OperationBuilder, schema_name: &str) -> OperationBuilder {
    builder.request_body(Some(
        RequestBodyBuilder::new()
            .required(Some(Required::True))
            .content(
                "application/json",
                ContentBuilder::new()
                    .schema(Some(Ref::from_schema_name(schema_name)))
                    .build(),
            )
            .build(),
    ))
}

/// The six operations of one collection: (path, method, operation).
fn collection_operations(
    router: &CollectionsRouter,
    entity: &EntityDescriptor,
) -> Vec<(String, HttpMethod, Operation)> {
    let tags = router.tags();
    let root = format!("{}/", router.collection_path(entity));
    let item = format!("{}/{{id}}", router.collection_path(entity));
    let plural = entity.table_name();
    let singular = entity.singular();
    let name = entity.name();
    let output = entity.output_schema();
    let input = entity.input_schema();
    let not_found = format!("{} not found", name);

    let mut list = operation(tags, format!("list_{}", plural), format!("List {}", plural));
    for p in filter_parameters(entity) {
        list = list.parameter(p);
    }
    let list = list
        .response(
            "200",
            ResponseBuilder::new()
                .description(format!("Active {}", plural))
                .content(
                    "application/json",
                    ContentBuilder::new()
                        .schema(Some(
                            ArrayBuilder::new()
                                .items(Ref::from_schema_name(output.name()))
                                .build(),
                        ))
                        .build(),
                )
                .build(),
        )
        .response("422", json_response("Invalid filter value", ERROR_SCHEMA))
        .build();

    let create = with_body(
        operation(tags, format!("create_{}", singular), format!("Create a {}", name)),
        input.name(),
    )
    .response("201", json_response("Created", output.name()))
    .response("422", json_response("Invalid payload or constraint violation", ERROR_SCHEMA))
    .build();

    let get = operation(tags, format!("get_{}", singular), format!("Get a {}", name))
        .parameter(id_parameter())
        .response("200", json_response("Found", output.name()))
        .response("404", json_response(&not_found, ERROR_SCHEMA))
        .build();

    let replace = with_body(
        operation(tags, format!("replace_{}", singular), format!("Replace a {}", name))
            .parameter(id_parameter()),
        input.name(),
    )
    .response("200", json_response("Replaced", output.name()))
    .response("404", json_response(&not_found, ERROR_SCHEMA))
    .response("422", json_response("Invalid payload or constraint violation", ERROR_SCHEMA))
    .build();

    let update = with_body(
        operation(tags, format!("update_{}", singular), format!("Partially update a {}", name))
            .parameter(id_parameter()),
        input.name(),
    )
    .response("200", json_response("Updated", output.name()))
    .response("404", json_response(&not_found, ERROR_SCHEMA))
    .response("422", json_response("Invalid payload or constraint violation", ERROR_SCHEMA))
    .build();

    let delete = operation(tags, format!("delete_{}", singular), format!("Soft delete a {}", name))
        .parameter(id_parameter())
        .response("204", json_response("Soft deleted", MESSAGE_SCHEMA))
        .response("404", json_response(&not_found, ERROR_SCHEMA))
        .build();

    vec![
        (root.clone(), HttpMethod::Get, list),
        (root, HttpMethod::Post, create),
        (item.clone(), HttpMethod::Get, get),
        (item.clone(), HttpMethod::Put, replace),
        (item.clone(), HttpMethod::Patch, update),
        (item, HttpMethod::Delete, delete),
    ]
}

/// Document every collection served by `routers`.
pub fn document(routers: &[CollectionsRouter]) -> OpenApi {
    let mut paths = Paths::new();
    let mut components = ComponentsBuilder::new()
        .schema(
            ERROR_SCHEMA,
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .property("detail", ObjectBuilder::new().schema_type(Type::String).build())
                .required("detail")
                .build(),
        )
        .schema(
            MESSAGE_SCHEMA,
            ObjectBuilder::new()
                .schema_type(Type::Object)
                .property("message", ObjectBuilder::new().schema_type(Type::String).build())
                .required("message")
                .build(),
        );
    let mut tags = Vec::new();
    for router in routers {
        for tag in router.tags() {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        for entity in router.collections() {
            let input = entity.input_schema();
            let output = entity.output_schema();
            components = components
                .schema(input.name(), schema_object(&input))
                .schema(output.name(), schema_object(&output));
            for (path, method, op) in collection_operations(router, entity) {
                paths.add_path_operation(path, vec![method], op);
            }
        }
    }
    OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(env!("CARGO_PKG_NAME"))
                .version(env!("CARGO_PKG_VERSION"))
                .build(),
        )
        .paths(paths)
        .components(Some(components.build()))
        .tags(Some(tags.into_iter().map(|t| TagBuilder::new().name(t).build())))
        .build()
}
