use crate::handlers::prelude::*;

/// Fields every page template reads through the header partial.
#[derive(Serialize)]
pub struct PageTmplData<'a, T: Serialize> {
    pub base_url_path: &'a str,
    pub title: &'a str,
    #[serde(flatten)]
    pub body: T,
}

pub fn render_page<T: Serialize>(
    state: &ServerState,
    template: &str,
    title: &str,
    body: T,
) -> HttpResult {
    let html = state
        .tmpl
        .render(
            template,
            &PageTmplData {
                base_url_path: &state.config.site_base_url_path,
                title,
                body,
            },
        )
        .map_err(|e| {
            log::error!("Failed to render {template} template: {e}");
            AppHttpError::Internal
        })?;
    Ok(HttpResponse::Ok()
        .append_header(ContentType(mime::TEXT_HTML))
        .body(html))
}

#[derive(Serialize)]
pub struct TeamJson {
    pub id: i64,
    pub name: String,
    pub founded: Option<String>,
}

impl From<db::teams::Model> for TeamJson {
    fn from(t: db::teams::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            founded: t.founded,
        }
    }
}

#[derive(Serialize)]
pub struct PlayerJson {
    pub id: i64,
    pub name: String,
    pub team_id: Option<i64>,
    pub role: Option<String>,
}

impl From<db::players::Model> for PlayerJson {
    fn from(p: db::players::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            team_id: p.team_id,
            role: p.role,
        }
    }
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}
