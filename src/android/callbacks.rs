//! Java-side browser callbacks held by the shell while a request is pending.

#![cfg(target_os = "android")]

use jni::objects::{GlobalRef, JObject, JValue};
use jni::JNIEnv;

use super::jni_util;
use crate::platform::{FileChooserCallback, GeolocationCallback};

/// `ValueCallback<Uri[]>` from `WebChromeClient.onShowFileChooser`
pub struct JavaFileChooserCallback {
    callback: GlobalRef,
}

impl JavaFileChooserCallback {
    pub fn new(env: &mut JNIEnv, callback: &JObject) -> jni::errors::Result<Self> {
        Ok(Self {
            callback: env.new_global_ref(callback)?,
        })
    }
}

impl FileChooserCallback for JavaFileChooserCallback {
    fn resolve(self: Box<Self>, uris: Option<Vec<String>>) {
        let result = jni_util::with_env(|env| {
            let value = match &uris {
                Some(uris) => {
                    let array = env.new_object_array(uris.len() as i32, "android/net/Uri", JObject::null())?;
                    for (i, uri) in uris.iter().enumerate() {
                        let s = env.new_string(uri)?;
                        let parsed = env
                            .call_static_method(
                                "android/net/Uri",
                                "parse",
                                "(Ljava/lang/String;)Landroid/net/Uri;",
                                &[(&s).into()],
                            )?
                            .l()?;
                        env.set_object_array_element(&array, i as i32, &parsed)?;
                    }
                    JObject::from(array)
                }
                None => JObject::null(),
            };
            env.call_method(
                self.callback.as_obj(),
                "onReceiveValue",
                "(Ljava/lang/Object;)V",
                &[JValue::Object(&value)],
            )?;
            Ok(())
        });
        if let Err(e) = result {
            log::error!("[Android] Failed to resolve file chooser callback: {}", e);
        }
    }
}

/// `GeolocationPermissions.Callback` from `WebChromeClient.onGeolocationPermissionsShowPrompt`
pub struct JavaGeolocationCallback {
    callback: GlobalRef,
}

impl JavaGeolocationCallback {
    pub fn new(env: &mut JNIEnv, callback: &JObject) -> jni::errors::Result<Self> {
        Ok(Self {
            callback: env.new_global_ref(callback)?,
        })
    }
}

impl GeolocationCallback for JavaGeolocationCallback {
    fn invoke(self: Box<Self>, origin: &str, allow: bool, retain: bool) {
        let result = jni_util::with_env(|env| {
            let origin = env.new_string(origin)?;
            env.call_method(
                self.callback.as_obj(),
                "invoke",
                "(Ljava/lang/String;ZZ)V",
                &[(&origin).into(), JValue::Bool(allow as u8), JValue::Bool(retain as u8)],
            )?;
            Ok(())
        });
        if let Err(e) = result {
            log::error!("[Android] Failed to resume geolocation prompt: {}", e);
        }
    }
}
