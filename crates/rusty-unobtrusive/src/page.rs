// File: src/page.rs
// Purpose: Headless page driver - a document, its binder, and user-style interactions

use serde::Serialize;

use crate::binder::{FormBinder, SubmitOutcome};
use crate::dom::{Document, NodeId};
use crate::error::DomError;
use crate::remote::RemoteTransport;

/// Presence and class of an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementInfo {
    pub found: bool,
    pub class: Option<String>,
}

/// First child of a message container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageInfo {
    pub found: bool,
    pub id: Option<String>,
    pub text: Option<String>,
}

/// What a user sees for one property: its message container, the message
/// inside it, and the input itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub container: ElementInfo,
    pub message: MessageInfo,
    pub input: ElementInfo,
}

impl ErrorInfo {
    /// Invalid-field snapshot with the usual ASP.NET classes
    pub fn invalid(property: &str, text: &str) -> Self {
        Self {
            container: ElementInfo {
                found: true,
                class: Some("field-validation-error".to_string()),
            },
            message: MessageInfo {
                found: true,
                id: Some(format!("{}-error", property)),
                text: Some(text.to_string()),
            },
            input: ElementInfo {
                found: true,
                class: Some("form-control input-validation-error".to_string()),
            },
        }
    }
}

/// A loaded page. Every structural change made through it is followed by a
/// binder observe pass.
pub struct Page<T> {
    document: Document,
    binder: FormBinder<T>,
    focused: Option<NodeId>,
}

impl<T: RemoteTransport> Page<T> {
    pub fn load(html: &str, mut binder: FormBinder<T>) -> Self {
        let mut document = Document::parse(html);
        binder.bind_all(&document);
        document.take_mutations();
        Self {
            document,
            binder,
            focused: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn binder(&self) -> &FormBinder<T> {
        &self.binder
    }

    pub fn binder_mut(&mut self) -> &mut FormBinder<T> {
        &mut self.binder
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    fn by_id(&self, id: &str) -> Result<NodeId, DomError> {
        self.document
            .element_by_id(id)
            .ok_or_else(|| DomError::UnknownId(id.to_string()))
    }

    /// Move focus to `id`, blurring whatever had it
    pub async fn focus(&mut self, id: &str) -> Result<(), DomError> {
        let node = self.by_id(id)?;
        if self.focused != Some(node) {
            self.blur().await;
            self.focused = Some(node);
        }
        Ok(())
    }

    pub async fn blur(&mut self) {
        if let Some(previous) = self.focused.take() {
            self.binder.blur(&mut self.document, previous).await;
        }
    }

    /// Focus `id` and append `text` to its value, as typing would
    pub async fn type_text(&mut self, id: &str, text: &str) -> Result<(), DomError> {
        self.focus(id).await?;
        let node = self.by_id(id)?;
        let mut value = self
            .document
            .element(node)
            .map(|e| e.value.clone())
            .unwrap_or_default();
        value.push_str(text);
        self.document.set_value(node, &value)
    }

    /// Focus `id` and replace its value
    pub async fn fill(&mut self, id: &str, text: &str) -> Result<(), DomError> {
        self.focus(id).await?;
        let node = self.by_id(id)?;
        self.document.set_value(node, text)
    }

    pub async fn check(&mut self, id: &str, checked: bool) -> Result<(), DomError> {
        self.focus(id).await?;
        let node = self.by_id(id)?;
        self.document.set_checked(node, checked)
    }

    /// Click a submit control: focus moves to it, then its form is validated
    pub async fn click_submit(&mut self, id: &str) -> Result<SubmitOutcome, DomError> {
        self.focus(id).await?;
        let node = self.by_id(id)?;
        let form = self
            .document
            .closest_form(node)
            .ok_or_else(|| DomError::NoForm(id.to_string()))?;
        Ok(self.binder.submit(&mut self.document, form).await)
    }

    /// Insert markup under `parent_id`, then let the binder pick it up
    pub fn inject_html(&mut self, parent_id: &str, html: &str) -> Result<Vec<NodeId>, DomError> {
        let parent = self.by_id(parent_id)?;
        let nodes = self.document.insert_html(parent, html)?;
        self.binder.observe(&mut self.document);
        Ok(nodes)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), DomError> {
        let node = self.by_id(id)?;
        if self.focused.is_some_and(|f| self.document.is_within(f, node)) {
            self.focused = None;
        }
        self.document.remove(node)?;
        self.binder.observe(&mut self.document);
        Ok(())
    }

    /// Explicit re-parse of the element `id` (a form or a container)
    pub fn reparse(&mut self, id: &str) -> Result<Vec<NodeId>, DomError> {
        let node = self.by_id(id)?;
        Ok(self.binder.parse(&self.document, node))
    }

    /// Snapshot of the container, message and input for `property`
    pub fn error_info(&self, property: &str) -> ErrorInfo {
        let doc = &self.document;
        let input = doc.element_by_id(property);
        let container = doc
            .find_by_attr(doc.root(), "data-valmsg-for", property)
            .into_iter()
            .next();
        let message = container.and_then(|c| {
            doc.children(c)
                .iter()
                .copied()
                .find(|n| doc.element(*n).is_some())
        });

        ErrorInfo {
            container: ElementInfo {
                found: container.is_some(),
                class: container.map(|c| doc.class_name(c)),
            },
            message: MessageInfo {
                found: message.is_some(),
                id: message.map(|m| doc.attr(m, "id").unwrap_or_default().to_string()),
                text: message.map(|m| doc.text(m).trim().to_string()),
            },
            input: ElementInfo {
                found: input.is_some(),
                class: input.map(|i| doc.class_name(i)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::RemoteError;
    use crate::remote::RemoteRequest;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    struct AlwaysValid;

    #[async_trait]
    impl RemoteTransport for AlwaysValid {
        async fn send(&self, _request: &RemoteRequest) -> Result<JsonValue, RemoteError> {
            Ok(json!(true))
        }

        fn name(&self) -> &'static str {
            "always-valid"
        }
    }

    const FORM: &str = r#"
        <form id="client-validation-form" method="post" action="/Validation/Validate">
          <div id="extra"></div>
          <input id="Password" name="Password" class="form-control" data-val="true" data-val-required="The Password field is required.">
          <input id="PasswordConfirmation" name="PasswordConfirmation" class="form-control" data-val="true"
            data-val-equalto="'PasswordConfirmation' and 'Password' do not match." data-val-equalto-other="*.Password"
            data-val-required="The PasswordConfirmation field is required.">
          <span class="field-validation-valid" data-valmsg-for="PasswordConfirmation" data-valmsg-replace="true"></span>
          <input type="submit" id="regular-submit" value="Submit">
        </form>"#;

    fn page() -> Page<AlwaysValid> {
        Page::load(FORM, FormBinder::new(AlwaysValid, &Config::default()))
    }

    #[tokio::test]
    async fn test_compare_scenario() {
        let mut page = page();
        page.type_text("Password", "1234").await.unwrap();
        page.type_text("PasswordConfirmation", "4321").await.unwrap();
        let outcome = page.click_submit("regular-submit").await.unwrap();
        assert!(!outcome.valid);

        assert_eq!(
            page.error_info("PasswordConfirmation"),
            ErrorInfo::invalid(
                "PasswordConfirmation",
                "'PasswordConfirmation' and 'Password' do not match."
            )
        );
    }

    #[tokio::test]
    async fn test_error_info_serializes_like_a_dom_probe() {
        let mut page = page();
        page.click_submit("regular-submit").await.unwrap();
        assert_eq!(
            serde_json::to_value(page.error_info("Password")).unwrap(),
            json!({
                "container": { "found": false, "class": null },
                "message": { "found": false, "id": null, "text": null },
                "input": { "found": true, "class": "form-control input-validation-error" }
            })
        );
    }

    #[tokio::test]
    async fn test_typing_appends() {
        let mut page = page();
        page.type_text("Password", "12").await.unwrap();
        page.type_text("Password", "34").await.unwrap();
        let node = page.document().element_by_id("Password").unwrap();
        assert_eq!(page.document().element(node).unwrap().value, "1234");
        assert_eq!(page.focused(), Some(node));
    }

    #[tokio::test]
    async fn test_injected_fields_are_validated() {
        let mut page = page();
        page.inject_html(
            "extra",
            r#"<input id="Nick" name="Nick" data-val="true" data-val-required="Nick needed">"#,
        )
        .unwrap();
        page.type_text("Password", "x").await.unwrap();
        page.type_text("PasswordConfirmation", "x").await.unwrap();
        let outcome = page.click_submit("regular-submit").await.unwrap();
        assert_eq!(outcome.errors, vec![("Nick".to_string(), "Nick needed".to_string())]);
    }

    #[tokio::test]
    async fn test_removed_form_submits_unbound() {
        let mut page = page();
        page.remove("extra").unwrap();
        let form = page.document().element_by_id("client-validation-form").unwrap();
        assert_eq!(page.reparse("client-validation-form").unwrap(), vec![form]);

        page.remove("client-validation-form").unwrap();
        assert_eq!(page.binder().active_validators(), 0);
        assert!(matches!(
            page.click_submit("regular-submit").await,
            Err(DomError::UnknownId(_))
        ));
    }

    #[test]
    fn test_unknown_property() {
        let page = page();
        let info = page.error_info("Nope");
        assert!(!info.container.found);
        assert!(!info.input.found);
    }
}
