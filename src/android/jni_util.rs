//! Shared JNI plumbing: the cached JavaVM, app class lookup and string conversion.

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JClass, JObject, JObjectArray, JString};
use jni::{JNIEnv, JavaVM};

use crate::error::{Result, ShellError};

/// Cached JavaVM reference
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

/// Cached ClassLoader reference (needed to find app classes from native threads)
static CLASS_LOADER: OnceLock<GlobalRef> = OnceLock::new();

/// Store the JavaVM for later use. Called when the shell is installed.
pub fn set_java_vm(vm: JavaVM) {
    let _ = JAVA_VM.set(vm);
}

pub fn java_vm() -> Result<&'static JavaVM> {
    JAVA_VM
        .get()
        .ok_or_else(|| ShellError::Platform("JavaVM not initialized".to_string()))
}

/// Run `f` with an env for the current thread, clearing any Java exception it leaves behind.
pub fn with_env<T>(f: impl FnOnce(&mut JNIEnv) -> jni::errors::Result<T>) -> Result<T> {
    let mut env = java_vm()?.attach_current_thread()?;
    let result = f(&mut *env);
    if result.is_err() {
        clear_exception(&mut env);
    }
    Ok(result?)
}

pub fn clear_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

/// Get or initialize the application's ClassLoader.
fn class_loader<'a>(env: &mut JNIEnv<'a>, context: &JObject) -> jni::errors::Result<JObject<'a>> {
    if let Some(cached) = CLASS_LOADER.get() {
        return env.new_local_ref(cached.as_obj());
    }

    let loader = env
        .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])?
        .l()?;
    let global = env.new_global_ref(&loader)?;
    let _ = CLASS_LOADER.set(global);
    Ok(loader)
}

/// Find an app (or androidx) class. `find_class` from a native frame only sees the
/// system loader, so fall back to the application's ClassLoader.
pub fn find_app_class<'a>(env: &mut JNIEnv<'a>, context: &JObject, class_name: &str) -> jni::errors::Result<JClass<'a>> {
    if let Ok(class) = env.find_class(class_name) {
        return Ok(class);
    }
    clear_exception(env);

    let loader = class_loader(env, context)?;
    let java_name = env.new_string(class_name.replace('/', "."))?;
    let class = env
        .call_method(
            &loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[(&java_name).into()],
        )?
        .l()?;
    Ok(JClass::from(class))
}

pub fn get_string(env: &mut JNIEnv, value: &JString) -> jni::errors::Result<String> {
    Ok(env.get_string(value)?.into())
}

/// `String[]` to `Vec<String>`; a null array is empty.
pub fn string_array(env: &mut JNIEnv, array: &JObjectArray) -> jni::errors::Result<Vec<String>> {
    if array.is_null() {
        return Ok(Vec::new());
    }
    let len = env.get_array_length(array)?;
    let mut out = Vec::with_capacity(len as usize);
    for i in 0..len {
        let element = env.get_object_array_element(array, i)?;
        if element.is_null() {
            continue;
        }
        let value = get_string(env, &JString::from(element))?;
        out.push(value);
    }
    Ok(out)
}

pub fn new_string_array<'a>(env: &mut JNIEnv<'a>, values: &[&str]) -> jni::errors::Result<JObjectArray<'a>> {
    let array = env.new_object_array(values.len() as i32, "java/lang/String", JObject::null())?;
    for (i, value) in values.iter().enumerate() {
        let s = env.new_string(value)?;
        env.set_object_array_element(&array, i as i32, &s)?;
    }
    Ok(array)
}
