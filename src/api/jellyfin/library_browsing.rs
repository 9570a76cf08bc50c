use super::{ImageType, JellyfinClient};
use crate::api::error::ApiError;
use crate::api::models::{Item, ItemDetails, ItemKind, ItemsResponse};

const DEFAULT_FIELDS: &str = "Overview,Genres,PremiereDate,ProductionYear,CommunityRating,OfficialRating,BackdropImageTags,ImageTags,UserData";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "Ascending",
            Self::Descending => "Descending",
        }
    }
}

/// Catalog query sent to `/Users/{id}/Items`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub kinds: Vec<ItemKind>,
    pub resumable: bool,
    pub sort_by: Vec<&'static str>,
    pub sort_order: SortOrder,
    pub limit: Option<u32>,
    pub start_index: Option<u32>,
    pub recursive: bool,
    pub parent_id: Option<String>,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            resumable: false,
            sort_by: vec!["SortName"],
            sort_order: SortOrder::Ascending,
            limit: None,
            start_index: None,
            recursive: true,
            parent_id: None,
        }
    }
}

impl ItemQuery {
    /// Partially watched items, most recently played first.
    pub fn continue_watching() -> Self {
        Self {
            resumable: true,
            sort_by: vec!["DatePlayed"],
            sort_order: SortOrder::Descending,
            limit: Some(10),
            ..Self::default()
        }
    }

    /// Items of one kind in title order.
    pub fn of_kind(kind: ItemKind) -> Self {
        Self {
            kinds: vec![kind],
            limit: Some(20),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub(crate) fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if self.resumable {
            params.push(("Filters", "IsResumable".to_string()));
        }
        let kinds: Vec<&str> = self
            .kinds
            .iter()
            .map(|kind| kind.as_query_value())
            .filter(|value| !value.is_empty())
            .collect();
        if !kinds.is_empty() {
            params.push(("IncludeItemTypes", kinds.join(",")));
        }
        if !self.sort_by.is_empty() {
            params.push(("SortBy", self.sort_by.join(",")));
            params.push(("SortOrder", self.sort_order.as_str().to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("Limit", limit.to_string()));
        }
        if let Some(start) = self.start_index {
            params.push(("StartIndex", start.to_string()));
        }
        params.push(("Recursive", self.recursive.to_string()));
        if let Some(parent) = &self.parent_id {
            params.push(("ParentId", parent.clone()));
        }
        params.push(("Fields", DEFAULT_FIELDS.to_string()));
        params
    }

    /// Kind whose library folder scopes this query, if any.
    fn library_kind(&self) -> Option<ItemKind> {
        match self.kinds.as_slice() {
            [kind] if kind.collection_type().is_some() => Some(*kind),
            _ => None,
        }
    }
}

impl JellyfinClient {
    /// Runs a catalog query. Typed queries are scoped to the configured
    /// library folder for their kind, else to the folder whose collection
    /// type matches; without either they run recursively over the whole
    /// catalog filtered by type.
    pub async fn get_items(&self, query: ItemQuery) -> Result<Vec<Item>, ApiError> {
        if query.resumable || query.parent_id.is_some() {
            return self.query_user_items(&query).await;
        }

        if let Some(kind) = query.library_kind() {
            if let Some(folder) = self.resolve_library_folder(kind).await? {
                return self.get_library_items(&folder, query).await;
            }
            tracing::debug!(?kind, "no library folder, querying whole catalog");
        }

        self.query_user_items(&query).await
    }

    async fn resolve_library_folder(&self, kind: ItemKind) -> Result<Option<String>, ApiError> {
        if let Some(folder) = self.config.folder_for(kind) {
            return Ok(Some(folder.to_string()));
        }
        let Some(collection_type) = kind.collection_type() else {
            return Ok(None);
        };
        let folders = self.get_media_folders().await?;
        Ok(folders
            .into_iter()
            .find(|folder| {
                folder
                    .collection_type
                    .as_deref()
                    .is_some_and(|value| value.eq_ignore_ascii_case(collection_type))
            })
            .map(|folder| folder.id))
    }

    async fn query_user_items(&self, query: &ItemQuery) -> Result<Vec<Item>, ApiError> {
        let keys = self.session_keys()?;
        let path = format!("/Users/{}/Items", urlencoding::encode(&keys.user_id));
        let response: ItemsResponse = self.get_json(&path, &query.to_params()).await?;
        Ok(response.items)
    }

    /// Top-level library folders of the signed-in user.
    pub async fn get_media_folders(&self) -> Result<Vec<Item>, ApiError> {
        let keys = self.session_keys()?;
        let path = format!("/Users/{}/Items", urlencoding::encode(&keys.user_id));
        let response: ItemsResponse = self.get_json(&path, &[]).await?;
        Ok(response.items)
    }

    pub async fn get_library_items(
        &self,
        parent_id: &str,
        query: ItemQuery,
    ) -> Result<Vec<Item>, ApiError> {
        if parent_id.trim().is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        self.query_user_items(&query.with_parent(parent_id)).await
    }

    pub async fn get_item_details(&self, item_id: &str) -> Result<ItemDetails, ApiError> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        let keys = self.session_keys()?;
        let path = format!("/Items/{}", urlencoding::encode(item_id));
        let item: Item = self
            .get_json(
                &path,
                &[
                    ("userId", keys.user_id),
                    ("Fields", DEFAULT_FIELDS.to_string()),
                ],
            )
            .await?;

        let primary_image_url = self.image_url(&item.id, ImageType::Primary);
        let backdrop_image_url = if item.has_backdrop() {
            self.image_url(&item.id, ImageType::Backdrop)
        } else {
            None
        };

        Ok(ItemDetails {
            item,
            primary_image_url,
            backdrop_image_url,
        })
    }

    pub async fn get_seasons(&self, series_id: &str) -> Result<Vec<Item>, ApiError> {
        if series_id.trim().is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        let keys = self.session_keys()?;
        let path = format!("/Shows/{}/Seasons", urlencoding::encode(series_id));
        let response: ItemsResponse = self
            .get_json(&path, &[("userId", keys.user_id)])
            .await?;
        Ok(response.items)
    }

    pub async fn get_season_episodes(
        &self,
        series_id: &str,
        season_id: &str,
    ) -> Result<Vec<Item>, ApiError> {
        if series_id.trim().is_empty() || season_id.trim().is_empty() {
            return Err(ApiError::InvalidItemId);
        }
        let keys = self.session_keys()?;
        let path = format!("/Shows/{}/Episodes", urlencoding::encode(series_id));
        let response: ItemsResponse = self
            .get_json(
                &path,
                &[
                    ("seasonId", season_id.to_string()),
                    ("userId", keys.user_id),
                    ("Fields", "Overview,UserData".to_string()),
                ],
            )
            .await?;
        Ok(response.items)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::api::models::ItemKind;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn items_body(items: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Items": items,
            "TotalRecordCount": 0
        }))
    }

    #[test]
    fn continue_watching_params() {
        let params = ItemQuery::continue_watching().to_params();

        assert!(params.contains(&("Filters", "IsResumable".to_string())));
        assert!(params.contains(&("SortBy", "DatePlayed".to_string())));
        assert!(params.contains(&("SortOrder", "Descending".to_string())));
        assert!(params.contains(&("Limit", "10".to_string())));
        assert!(params.contains(&("Recursive", "true".to_string())));
        assert!(!params.iter().any(|(key, _)| *key == "IncludeItemTypes"));
    }

    #[tokio::test]
    async fn typed_query_uses_matching_collection_folder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(query_param_is_missing("ParentId"))
            .and(query_param_is_missing("IncludeItemTypes"))
            .respond_with(items_body(serde_json::json!([
                {"Id": "f-music", "Name": "Filmes", "Type": "CollectionFolder", "CollectionType": "music"},
                {"Id": "f-movies", "Name": "Biblioteca", "Type": "CollectionFolder", "CollectionType": "movies"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(query_param("ParentId", "f-movies"))
            .and(query_param("IncludeItemTypes", "Movie"))
            .and(header("X-MediaBrowser-Token", "tok-abc"))
            .respond_with(items_body(serde_json::json!([
                {"Id": "movie-42", "Name": "Arrival", "Type": "Movie"}
            ])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let items = client
            .get_items(ItemQuery::of_kind(ItemKind::Movie))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "movie-42");
    }

    #[tokio::test]
    async fn configured_folder_skips_folder_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(query_param("ParentId", "f-shows"))
            .respond_with(items_body(serde_json::json!([
                {"Id": "series-7", "Name": "Dark", "Type": "Series"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = signed_in_client(&server.uri());
        client
            .config
            .libraries
            .insert(ItemKind::Series, "f-shows".to_string());

        let items = client
            .get_items(ItemQuery::of_kind(ItemKind::Series))
            .await
            .unwrap();

        assert_eq!(items[0].kind, ItemKind::Series);
    }

    #[tokio::test]
    async fn typed_query_without_folder_filters_whole_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(query_param_is_missing("IncludeItemTypes"))
            .respond_with(items_body(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Users/user-1/Items"))
            .and(query_param("IncludeItemTypes", "Movie"))
            .and(query_param("Recursive", "true"))
            .and(query_param_is_missing("ParentId"))
            .respond_with(items_body(serde_json::json!([
                {"Id": "movie-1", "Type": "Movie"}
            ])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let items = client
            .get_items(ItemQuery::of_kind(ItemKind::Movie))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn item_details_derive_image_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Items/movie-42"))
            .and(query_param("userId", "user-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Id": "movie-42",
                "Name": "Arrival",
                "Type": "Movie",
                "BackdropImageTags": ["b1"]
            })))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let details = client.get_item_details("movie-42").await.unwrap();

        assert_eq!(details.item.name, "Arrival");
        assert!(details
            .primary_image_url
            .as_deref()
            .is_some_and(|url| url.contains("/Items/movie-42/Images/Primary")));
        assert!(details
            .backdrop_image_url
            .as_deref()
            .is_some_and(|url| url.contains("/Images/Backdrop")));
    }

    #[tokio::test]
    async fn empty_item_id_is_rejected() {
        let client = signed_in_client("http://127.0.0.1:9");
        assert_eq!(
            client.get_item_details(" ").await.unwrap_err(),
            ApiError::InvalidItemId
        );
    }

    #[tokio::test]
    async fn season_episodes_are_scoped_to_season() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Shows/series-7/Episodes"))
            .and(query_param("seasonId", "season-1"))
            .respond_with(items_body(serde_json::json!([
                {"Id": "ep-1", "Name": "Secrets", "Type": "Episode", "IndexNumber": 1}
            ])))
            .mount(&server)
            .await;

        let client = signed_in_client(&server.uri());
        let episodes = client
            .get_season_episodes("series-7", "season-1")
            .await
            .unwrap();

        assert_eq!(episodes[0].index_number, Some(1));
    }
}
