// File: src/routes.rs
// Purpose: Validation controller - form pages, the submit target and the remote endpoints

use axum::{
    extract::{Form, Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use maud::{html, Escaper, Markup, PreEscaped, DOCTYPE};
use std::collections::HashMap;
use std::fmt::Write;
use tracing::{debug, info};

use crate::model::{form_properties, Property};

const DEFAULT_PROPERTY: &str = "LastName";

pub fn app() -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/Validation/Index") }))
        .route("/Validation/Index", get(index_default))
        .route("/Validation/Index/:property", get(index))
        .route("/Validation/Validate", post(validate))
        .route("/Validation/UserName", post(user_name))
        .route("/Validation/Likes", get(likes))
        .route("/Home/Error", get(error_page))
}

async fn index_default() -> Response {
    render_index(DEFAULT_PROPERTY)
}

async fn index(Path(property): Path<String>) -> Response {
    render_index(&property)
}

fn render_index(property: &str) -> Response {
    let properties = form_properties(property);
    if properties.is_empty() {
        debug!(property, "unknown property");
        return (
            StatusCode::NOT_FOUND,
            Html(layout("Not found", html! { p { "Unknown property: " (property) } }).into_string()),
        )
            .into_response();
    }

    let markup = layout(
        "Client validation",
        html! {
            form id="client-validation-form" method="post" action="/Validation/Validate" {
                div class="validation-summary-valid" data-valmsg-summary="true" {
                    ul { li style="display:none" {} }
                }
                @for p in &properties {
                    (editor(p))
                }
                input type="submit" id="regular-submit" class="btn btn-primary" value="Submit";
            }
        },
    );
    Html(markup.into_string()).into_response()
}

/// Label, input and message container for one property
fn editor(property: &Property) -> Markup {
    let mut input = format!(
        r#"<input class="form-control" type="{}" id="{}" name="{}""#,
        property.input_type(),
        property.name,
        property.name
    );
    for (key, value) in property.attributes() {
        input.push_str(&format!(r#" {}=""#, key));
        // Writing into a String cannot fail
        let _ = Escaper::new(&mut input).write_str(&value);
        input.push('"');
    }
    input.push('>');

    html! {
        div class="form-group" {
            label for=(property.name) { (property.name) }
            (PreEscaped(input))
            span class="field-validation-valid" data-valmsg-for=(property.name) data-valmsg-replace="true" {}
        }
    }
}

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
            }
            body { (body) }
        }
    }
}

async fn validate(Form(fields): Form<HashMap<String, String>>) -> Redirect {
    info!(fields = fields.len(), "form posted");
    Redirect::to("/Home/Error")
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Valid only for names starting with "a"
async fn user_name(Form(fields): Form<HashMap<String, String>>) -> Json<bool> {
    let valid = field(&fields, "userName").is_some_and(|v| v.starts_with('a'));
    debug!(valid, "UserName checked");
    Json(valid)
}

/// Valid unless negative; unparseable input counts as 0
async fn likes(Query(query): Query<HashMap<String, String>>) -> Json<bool> {
    let likes = field(&query, "likes")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    debug!(likes, "Likes checked");
    Json(likes >= 0)
}

async fn error_page() -> Html<String> {
    Html(layout("Error", html! { h1 { "Error." } p { "An error occurred while processing your request." } }).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{validation_model, Annotation, ValueKind};

    #[test]
    fn test_editor_carries_attributes() {
        let model = validation_model();
        let age = model.iter().find(|p| p.name == "Age").unwrap();
        let markup = editor(age).into_string();
        assert!(markup.contains(r#"id="Age" name="Age""#));
        assert!(markup.contains(r#"data-val-range-min="18""#));
        assert!(markup.contains(r#"data-valmsg-for="Age""#));
    }

    #[test]
    fn test_regex_attribute_survives_escaping() {
        let model = validation_model();
        let tag = model.iter().find(|p| p.name == "Tag").unwrap();
        let markup = editor(tag).into_string();
        assert!(markup.contains(r#"data-val-regex-pattern="web\..*""#));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let property = Property {
            name: "Q",
            kind: ValueKind::Text,
            annotations: vec![Annotation::RegularExpression(r#"a"&<b"#)],
        };
        let markup = editor(&property).into_string();
        assert!(markup.contains(r#"data-val-regex-pattern="a&quot;&amp;&lt;b""#));
    }
}
