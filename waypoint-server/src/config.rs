use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use waypoint_router::{Method, PatternOverrides};

/// Template -> declared method/handler pairs, in declaration order.
pub type ProjectRoutes = IndexMap<String, Vec<RouteSpec>>;

#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub routes: ProjectRoutes,
}

impl ProjectConfig {
    pub fn from_yaml(yml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yml)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteSpec {
    #[serde(deserialize_with = "deserialize_method")]
    pub method: Method,
    pub handler: String,
    #[serde(default)]
    pub patterns: IndexMap<String, String>,
}

impl RouteSpec {
    pub fn overrides(&self) -> PatternOverrides {
        self.patterns
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<Method, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        "PATCH" => Ok(Method::PATCH),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        "CONNECT" => Ok(Method::CONNECT),
        "TRACE" => Ok(Method::TRACE),
        _ => Err(serde::de::Error::custom("invalid method")),
    }
}
