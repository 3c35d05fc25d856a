use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect},
    Extension, Json,
};
use chrono::Utc;

use crate::{
    authentication::MaybeAdmin,
    data_formats::{
        AdminSettingsResponse, CategoryPageResponse, CommentRequest, CommentResponse,
        CommentWrapper, MultiplePostsWrapper, PageQueryParams, PageRequest, PostPageResponse,
        PostQueryParams, SettingsWrapper, SidebarResponse,
    },
    db_helpers::{
        count_unread_comments, create_comment_in_db, get_admin, get_category_by_id,
        get_comment_by_id, get_post_by_id, list_categories, list_links, list_posts,
        list_posts_in_category, list_reviewed_comments_for_post, reviewed_count,
    },
    errors::RequestError,
    models::NewComment,
    redirects::RedirectBack,
    uploads::is_safe_filename,
    AppContext,
};

const THEME_COOKIE_MAX_AGE: i64 = 30 * 24 * 60 * 60;

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Reading Handlers -----------------
pub async fn index(
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<PageQueryParams>,
) -> JsonResult<MultiplePostsWrapper> {
    if params.page == 0 {
        return Err(RequestError::NotFound("Page not found"));
    }
    let posts = list_posts(
        &ctx.pool,
        PageRequest::new(params.page, ctx.config.post_per_page),
    )
    .await?;
    if posts.is_past_end() {
        return Err(RequestError::NotFound("Page not found"));
    }
    Ok(Json(MultiplePostsWrapper { posts }))
}

pub async fn about(
    Extension(ctx): Extension<Arc<AppContext>>,
) -> JsonResult<SettingsWrapper<AdminSettingsResponse>> {
    match get_admin(&ctx.pool).await? {
        Some(admin) => Ok(Json(SettingsWrapper {
            settings: AdminSettingsResponse::new(admin),
        })),
        None => Err(RequestError::NotFound("No account found.")),
    }
}

/// Blog-wide data shown around every page.
pub async fn sidebar(
    Extension(ctx): Extension<Arc<AppContext>>,
    maybe_admin: MaybeAdmin,
) -> JsonResult<SidebarResponse> {
    let admin = get_admin(&ctx.pool).await?.map(AdminSettingsResponse::new);
    let categories = list_categories(&ctx.pool).await?;
    let links = list_links(&ctx.pool).await?;
    let unread_comments = if maybe_admin.is_authenticated() {
        Some(count_unread_comments(&ctx.pool).await?)
    } else {
        None
    };
    Ok(Json(SidebarResponse {
        admin,
        categories,
        links,
        unread_comments,
    }))
}

pub async fn show_category(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(category_id): Path<i64>,
    Query(params): Query<PageQueryParams>,
) -> JsonResult<CategoryPageResponse> {
    let category = get_category_by_id(&ctx.pool, category_id)
        .await?
        .ok_or(RequestError::NotFound("Category not found"))?;
    if params.page == 0 {
        return Err(RequestError::NotFound("Page not found"));
    }
    let posts = list_posts_in_category(
        &ctx.pool,
        category.id,
        PageRequest::new(params.page, ctx.config.post_per_page),
    )
    .await?;
    if posts.is_past_end() {
        return Err(RequestError::NotFound("Page not found"));
    }
    Ok(Json(CategoryPageResponse { category, posts }))
}

pub async fn show_post(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(post_id): Path<i64>,
    Query(params): Query<PostQueryParams>,
) -> JsonResult<PostPageResponse> {
    let post = get_post_by_id(&ctx.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))?;
    if params.page == 0 {
        return Err(RequestError::NotFound("Page not found"));
    }
    let category = get_category_by_id(&ctx.pool, post.category_id)
        .await?
        .ok_or(RequestError::ServerError)?;
    let comments = list_reviewed_comments_for_post(
        &ctx.pool,
        post.id,
        PageRequest::new(params.page, ctx.config.comment_per_page),
    )
    .await?;
    if comments.is_past_end() {
        return Err(RequestError::NotFound("Page not found"));
    }
    let reviewed_count = reviewed_count(&ctx.pool, post.id).await?;
    Ok(Json(PostPageResponse {
        post,
        category,
        reviewed_count,
        comments: comments.map(CommentResponse::new),
    }))
}

// ----------------- Comment Handlers -----------------

/// Visitors' comments wait for review; the logged-in owner's are published
/// at once under the owner identity.
pub async fn submit_comment(
    Extension(ctx): Extension<Arc<AppContext>>,
    maybe_admin: MaybeAdmin,
    Path(post_id): Path<i64>,
    Query(params): Query<PostQueryParams>,
    Json(CommentWrapper { comment: request }): Json<CommentWrapper<CommentRequest>>,
) -> Result<(StatusCode, Json<CommentWrapper<CommentResponse>>), RequestError> {
    let post = get_post_by_id(&ctx.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))?;
    let from_admin = maybe_admin.is_authenticated();
    request.validate_for(from_admin)?;

    let new = NewComment::new(
        request,
        from_admin,
        post.id,
        &ctx.config.owner(),
        Utc::now(),
    );
    let created = create_comment_in_db(&ctx.pool, new, params.reply).await?;

    if let Some(replied) = &created.replied {
        ctx.notifier.new_reply(replied, &created.post);
    }
    if !from_admin {
        ctx.notifier.new_comment(&created.post, &ctx.config.admin_email);
    }
    Ok((
        StatusCode::CREATED,
        Json(CommentWrapper {
            comment: CommentResponse::new(created.comment),
        }),
    ))
}

pub async fn reply_comment(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(comment_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    let comment = get_comment_by_id(&ctx.pool, comment_id)
        .await?
        .ok_or(RequestError::NotFound("Comment not found"))?;
    let post = get_post_by_id(&ctx.pool, comment.post_id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))?;
    if post.no_comment {
        tracing::debug!(post = post.id, "reply requested on post with comments disabled");
        return Ok(Redirect::to(&format!("/post/{}", post.id)));
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("reply", &comment.id.to_string())
        .append_pair("author", &comment.author)
        .finish();
    Ok(Redirect::to(&format!("/post/{}?{}#comment-form", post.id, query)))
}

// ----------------- Misc Handlers -----------------
pub async fn change_theme(
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
    Path(theme_name): Path<String>,
) -> Result<impl IntoResponse, RequestError> {
    if !ctx.config.has_theme(&theme_name) {
        return Err(RequestError::BadRequest("Invalid theme name."));
    }
    let cookie = format!("theme={}; Path=/; Max-Age={}", theme_name, THEME_COOKIE_MAX_AGE);
    Ok(([(header::SET_COOKIE, cookie)], back.to("/")))
}

pub async fn get_image(
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, RequestError> {
    if !is_safe_filename(&filename) {
        return Err(RequestError::NotFound("File not found"));
    }
    let path = ctx.config.upload_path.join(&filename);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RequestError::NotFound("File not found"))
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "could not read upload");
            return Err(RequestError::ServerError);
        }
    };
    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], data))
}
