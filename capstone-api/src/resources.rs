//! Capstone, user and session resources.
//!
//! Endpoints used:
//!   * GET/POST        /api/capstones
//!   * GET/PUT/DELETE  /api/capstones/{id}
//!   * GET/POST        /api/users
//!   * GET/PUT/DELETE  /api/users/{id}
//!   * GET             /api/users/current
//!   * POST            /api/login, /api/logout

use tracing::{debug, info, instrument};

use crate::client::CapstoneClient;
use crate::errors::ApiResult;
use crate::types::{
    Capstone, CapstoneDraft, CurrentUser, LoginResponse, Message, NewUser, Page, User, UserUpdate,
};

impl CapstoneClient {
    /* --------------------- Capstones --------------------- */

    /// Lists capstones, optionally filtered by a full-text query.
    #[instrument(skip(self))]
    pub async fn list_capstones(
        &self,
        page: u32,
        per_page: u32,
        q: Option<&str>,
    ) -> ApiResult<Page<Capstone>> {
        let mut url = self.url(&format!("/api/capstones?page={page}&per_page={per_page}"));
        if let Some(q) = q.filter(|q| !q.trim().is_empty()) {
            url.push_str(&format!("&q={}", urlencoding::encode(q)));
        }
        debug!("GET {}", url);
        self.send_json(self.http().get(&url), url).await
    }

    /// Fetches a single capstone.
    #[instrument(skip(self))]
    pub async fn get_capstone(&self, id: i64) -> ApiResult<Capstone> {
        let url = self.url(&format!("/api/capstones/{id}"));
        debug!("GET {}", url);
        self.send_json(self.http().get(&url), url).await
    }

    /// Creates a capstone and returns the stored record.
    #[instrument(skip_all, fields(title = %draft.title))]
    pub async fn create_capstone(&self, draft: &CapstoneDraft) -> ApiResult<Capstone> {
        let url = self.url("/api/capstones");
        debug!("POST {}", url);
        self.send_json(self.http().post(&url).json(draft), url).await
    }

    /// Replaces the editable fields of a capstone.
    #[instrument(skip(self, draft))]
    pub async fn update_capstone(&self, id: i64, draft: &CapstoneDraft) -> ApiResult<Capstone> {
        let url = self.url(&format!("/api/capstones/{id}"));
        debug!("PUT {}", url);
        self.send_json(self.http().put(&url).json(draft), url).await
    }

    /// Deletes a capstone.
    #[instrument(skip(self))]
    pub async fn delete_capstone(&self, id: i64) -> ApiResult<String> {
        let url = self.url(&format!("/api/capstones/{id}"));
        debug!("DELETE {}", url);
        let ack: Message = self.send_json(self.http().delete(&url), url).await?;
        Ok(ack.message)
    }

    /* --------------------- Users --------------------- */

    /// Lists users, optionally filtered by email/role substring.
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> ApiResult<Page<User>> {
        let mut url = self.url(&format!("/api/users?page={page}&per_page={per_page}"));
        if let Some(s) = search.filter(|s| !s.trim().is_empty()) {
            url.push_str(&format!("&search={}", urlencoding::encode(s)));
        }
        debug!("GET {}", url);
        self.send_json(self.http().get(&url), url).await
    }

    /// Fetches a single user.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> ApiResult<User> {
        let url = self.url(&format!("/api/users/{id}"));
        debug!("GET {}", url);
        self.send_json(self.http().get(&url), url).await
    }

    /// Creates a user.
    #[instrument(skip_all, fields(email = %user.email, role = %user.role))]
    pub async fn create_user(&self, user: &NewUser) -> ApiResult<User> {
        let url = self.url("/api/users");
        debug!("POST {}", url);
        self.send_json(self.http().post(&url).json(user), url).await
    }

    /// Applies a partial update to a user.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> ApiResult<User> {
        let url = self.url(&format!("/api/users/{id}"));
        debug!("PUT {}", url);
        self.send_json(self.http().put(&url).json(update), url).await
    }

    /// Deletes a user.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> ApiResult<String> {
        let url = self.url(&format!("/api/users/{id}"));
        debug!("DELETE {}", url);
        let ack: Message = self.send_json(self.http().delete(&url), url).await?;
        Ok(ack.message)
    }

    /* --------------------- Session --------------------- */

    /// Exchanges credentials for an access token.
    ///
    /// The token is opaque to this crate; pass it back through
    /// [`CapstoneClient::with_token`] or `CAPSTONE_API_TOKEN`.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let url = self.url("/api/login");
        debug!("POST {}", url);
        let form = [("username", username), ("password", password)];
        let resp: LoginResponse = self.send_json(self.http().post(&url).form(&form), url).await?;
        info!(role = %resp.data.user.role, "logged in");
        Ok(resp)
    }

    /// Ends the server-side session.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> ApiResult<String> {
        let url = self.url("/api/logout");
        debug!("POST {}", url);
        let ack: Message = self.send_json(self.http().post(&url), url).await?;
        Ok(ack.message)
    }

    /// Returns the identity bound to the current credential.
    #[instrument(skip_all)]
    pub async fn current_user(&self) -> ApiResult<CurrentUser> {
        let url = self.url("/api/users/current");
        debug!("GET {}", url);
        self.send_json(self.http().get(&url), url).await
    }
}
