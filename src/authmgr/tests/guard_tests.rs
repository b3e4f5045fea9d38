//! Host-side guard flows driven by a JSON configuration

use authmgr::guard::{capability_for_action, AjaxDenial};
use authmgr::{AdminRequest, AuthConfig, Authorizer, AuthzError, Denial, GuardedEntry, RequestContext};

const CONFIG: &str = r#"{
    "anonymous_capabilities": ["ViewStats"],
    "role_assignment": {
        "Administrator": ["Root"],
        "Editor": ["ed"],
        "Contributor": ["Connie"]
    },
    "admin_ip_ranges": ["10.8.0.0/16"]
}"#;

fn authorizer() -> Authorizer {
    Authorizer::from_config(AuthConfig::from_json_str(CONFIG).unwrap()).unwrap()
}

fn denial(result: authmgr::Result<()>) -> Option<Denial> {
    match result {
        Ok(()) => None,
        Err(AuthzError::AccessDenied { denial, .. }) => Some(denial),
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
fn test_admin_page_flow() {
    let authorizer = authorizer();

    let connie = RequestContext::authenticated("connie", "203.0.113.3");
    assert!(authorizer.guard_entry(GuardedEntry::AdminPage, &connie).is_ok());

    let add = AdminRequest::Ajax { action: "add".to_string() };
    let edit = AdminRequest::Ajax {
        action: "edit_save".to_string(),
    };
    assert!(authorizer.authorize_admin_action(&add, &connie).is_ok());
    assert_eq!(denial(authorizer.authorize_admin_action(&edit, &connie)), Some(Denial::Ajax));

    let ed = RequestContext::authenticated("ED", "203.0.113.3");
    assert!(authorizer.authorize_admin_action(&edit, &ed).is_ok());
}

#[test]
fn test_stats_page_is_public() {
    let authorizer = authorizer();
    let visitor = RequestContext::anonymous("203.0.113.200");

    assert!(authorizer.guard_entry(GuardedEntry::StatsPage, &visitor).is_ok());
    assert_eq!(
        denial(authorizer.guard_entry(GuardedEntry::AdminPage, &visitor)),
        Some(Denial::Forbidden)
    );
}

#[test]
fn test_api_entry() {
    let authorizer = authorizer();

    let keyless = RequestContext::anonymous("203.0.113.7").with_api_mode(false);
    assert!(authorizer.guard_entry(GuardedEntry::Api, &keyless).is_ok());

    let connie_api = RequestContext::authenticated("connie", "203.0.113.7").with_api_mode(true);
    assert_eq!(
        denial(authorizer.guard_entry(GuardedEntry::Api, &connie_api)),
        Some(Denial::AccessDenied)
    );

    let root_api = RequestContext::authenticated("root", "203.0.113.7").with_api_mode(true);
    assert!(authorizer.guard_entry(GuardedEntry::Api, &root_api).is_ok());
}

#[test]
fn test_operator_network_manages_plugins() {
    let authorizer = authorizer();
    let operator = RequestContext::anonymous("10.8.3.3");
    let deactivate = AdminRequest::PluginManagement {
        action: "deactivate".to_string(),
    };

    assert!(authorizer.authorize_admin_action(&deactivate, &operator).is_ok());

    let ed = RequestContext::authenticated("ed", "203.0.113.3");
    assert_eq!(
        denial(authorizer.authorize_admin_action(&deactivate, &ed)),
        Some(Denial::AccessDenied)
    );
}

#[test]
fn test_denied_error_message() {
    let authorizer = authorizer();
    let visitor = RequestContext::anonymous("203.0.113.200");

    let err = authorizer.require_capability("DeleteURL", &visitor).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("DeleteURL"), "{}", message);
    assert!(message.contains("forbidden"), "{}", message);
}

#[test]
fn test_every_mapped_action_is_a_known_capability() {
    let authorizer = authorizer();
    for action in ["add", "delete", "edit_display", "edit_save", "activate", "deactivate"] {
        let capability = capability_for_action(action).unwrap();
        assert!(authorizer.known_capabilities().iter().any(|c| c == capability.as_str()));
    }
}

#[test]
fn test_ajax_denial_round_trips_through_json() {
    let body = serde_json::to_string(&AjaxDenial::default()).unwrap();
    let parsed: AjaxDenial = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed.error_code, "403");
    assert!(body.contains("\"errorCode\":\"403\""));
}

#[test]
fn test_capability_summary_for_logout_link() {
    let authorizer = authorizer();
    let ed = RequestContext::authenticated("ed", "203.0.113.3");

    assert_eq!(
        authorizer.capability_summary(&ed).unwrap().as_deref(),
        Some("ShowAdmin, AddURL, DeleteURL, EditURL, ViewStats")
    );
}
