//! Vars file handed to `bosh delete-env`

use crate::error::{BoshError, Result};
use undeploy_core::{DirectorCredentials, EnvironmentDescriptor};

/// Render the environment and director credentials as a flat YAML vars
/// document. Keys in `extra` (a JSON object) are merged in last and win.
pub fn render(
    environment: &EnvironmentDescriptor,
    credentials: &DirectorCredentials,
    extra: Option<&serde_json::Value>,
) -> Result<String> {
    let mut vars = serde_json::Map::new();
    if let serde_json::Value::Object(map) = serde_json::to_value(environment)? {
        vars.extend(map);
    }

    vars.insert("director_password".into(), credentials.password.clone().into());
    vars.insert("director_cert".into(), credentials.cert.clone().into());
    vars.insert("director_key".into(), credentials.key.clone().into());
    vars.insert("director_ca_cert".into(), credentials.ca_cert.clone().into());

    match extra {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(map)) => {
            for (key, value) in map {
                vars.insert(key.clone(), value.clone());
            }
        }
        Some(other) => {
            return Err(BoshError::CommandFailed(format!(
                "extra vars must be an object, got {}",
                other
            )));
        }
    }

    Ok(serde_yaml::to_string(&vars)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment() -> EnvironmentDescriptor {
        EnvironmentDescriptor {
            director_name: "bosh".to_string(),
            external_ip: "34.1.2.3".to_string(),
            credentials_ref: "/secrets/gcp.json".to_string(),
            internal_cidr: "10.0.0.0/24".to_string(),
            internal_gateway: "10.0.0.1".to_string(),
            internal_ip: "10.0.0.6".to_string(),
            network: "ci-network".to_string(),
            private_subnetwork: "ci-private".to_string(),
            project_id: "ci-project".to_string(),
            public_key: "ssh-rsa AAAA".to_string(),
            public_subnetwork: "ci-public".to_string(),
            spot: false,
            zone: "europe-west1-b".to_string(),
        }
    }

    fn credentials() -> DirectorCredentials {
        DirectorCredentials {
            password: "secret".to_string(),
            cert: "CERT".to_string(),
            key: "KEY".to_string(),
            ca_cert: "CA".to_string(),
        }
    }

    #[test]
    fn test_render_flat_vars() {
        let yaml = render(&environment(), &credentials(), None).unwrap();
        let vars: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(vars["internal_gateway"].as_str(), Some("10.0.0.1"));
        assert_eq!(vars["internal_ip"].as_str(), Some("10.0.0.6"));
        assert_eq!(vars["project_id"].as_str(), Some("ci-project"));
        assert_eq!(vars["spot"].as_bool(), Some(false));
        assert_eq!(vars["director_password"].as_str(), Some("secret"));
        assert_eq!(vars["director_ca_cert"].as_str(), Some("CA"));
    }

    #[test]
    fn test_extra_vars_override() {
        let extra = serde_json::json!({ "zone": "europe-west1-c", "tags": ["ci"] });
        let yaml = render(&environment(), &credentials(), Some(&extra)).unwrap();
        let vars: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(vars["zone"].as_str(), Some("europe-west1-c"));
        assert_eq!(vars["tags"][0].as_str(), Some("ci"));
    }

    #[test]
    fn test_extra_vars_must_be_object() {
        let extra = serde_json::json!(["nope"]);
        assert!(render(&environment(), &credentials(), Some(&extra)).is_err());
    }
}
