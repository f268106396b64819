mod model;

use proc_macro::TokenStream;

/// Derive macro for the `Model` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Deserialize, Model)]
/// #[model(data = UserData, patch = UserPatch)]
/// #[serde(rename_all = "camelCase")]
/// struct User {
///     #[model(id)]
///     pub uid: String,
///     pub name: String,
///     #[serde(default, with = "document_repo::date::option")]
///     pub created_at: Option<DateTime<Utc>>,
///     #[serde(default, with = "document_repo::date::option")]
///     pub updated_at: Option<DateTime<Utc>>,
/// }
/// ```
///
/// - `#[model(data = T, patch = U)]` sets the write payload types. Both default
///   to a plain `Document`.
/// - `#[model(id_field = "...", created_at_field = "...", updated_at_field = "...")]`
///   override the stored field names.
/// - `#[model(id)]` marks the identifier field. If omitted, defaults to a field
///   named `id`.
/// - `#[model(created_at)]` / `#[model(updated_at)]` mark the timestamp fields.
///   If omitted, fields named `created_at` / `updated_at` are used when present.
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    model::derive_model(input)
}
