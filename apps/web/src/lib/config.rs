//! Build-time configuration for the backend endpoint with an optional runtime
//! override. The override is read from `window.KONTO_CONFIG` (if present) so
//! static deployments can point at another backend without rebuilding. Both
//! values are public; the API key is the anonymous role key, not a secret.

/// Frontend configuration derived from build-time environment variables.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend_url: String,
    pub api_key: String,
}

impl AppConfig {
    /// Loads config from build-time environment variables and applies runtime overrides.
    pub fn load() -> Self {
        let backend_url = option_env!("KONTO_BACKEND_URL").unwrap_or("");
        let api_key = option_env!("KONTO_API_KEY").unwrap_or("");

        let mut config = Self {
            backend_url: backend_url.to_string(),
            api_key: api_key.to_string(),
        };

        if let Some(runtime) = runtime_config() {
            apply_runtime_overrides(&mut config, runtime);
        }

        config
    }
}

#[derive(Default)]
struct RuntimeConfig {
    backend_url: Option<String>,
    api_key: Option<String>,
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.backend_url {
        config.backend_url = value;
    }
    if let Some(value) = runtime.api_key {
        config.api_key = value;
    }
}

#[cfg(target_arch = "wasm32")]
fn runtime_config() -> Option<RuntimeConfig> {
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;

    let window = web_sys::window()?;
    let config = Reflect::get(&window, &JsValue::from_str("KONTO_CONFIG")).ok()?;
    if config.is_null() || config.is_undefined() {
        return None;
    }
    let object = Object::from(config);

    Some(RuntimeConfig {
        backend_url: read_runtime_value(&object, "backend_url"),
        api_key: read_runtime_value(&object, "api_key"),
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn runtime_config() -> Option<RuntimeConfig> {
    None
}

#[cfg(target_arch = "wasm32")]
fn read_runtime_value(object: &js_sys::Object, key: &str) -> Option<String> {
    let value = js_sys::Reflect::get(object, &wasm_bindgen::JsValue::from_str(key))
        .ok()?
        .as_string()?;
    normalize_runtime_value(&value)
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
