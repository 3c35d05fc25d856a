use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};

use crate::{
    authentication::AdminSession,
    data_formats::{
        AdminSettingsResponse, CategoryRequest, CategoryWrapper, CommentFilter,
        CommentManageQueryParams, LinkRequest, LinkWrapper, MultipleCategoriesWrapper,
        MultipleCommentsWrapper, MultipleLinksWrapper, MultiplePostsWrapper, PageQueryParams,
        PageRequest, PostRequest, PostWrapper, SettingsRequest, SettingsWrapper, UploadResponse,
        Validate,
    },
    db_helpers::{
        approve_all_pending_in_db, approve_comment_in_db, create_category_in_db,
        create_link_in_db, create_post_in_db, delete_category_in_db, delete_comment_in_db,
        delete_link_in_db, delete_post_in_db, get_admin_by_id, get_post_by_id, list_categories,
        list_comments_for_review, list_links, list_posts, rename_category_in_db,
        toggle_no_comment_in_db, update_link_in_db, update_post_in_db, update_settings_in_db,
    },
    errors::RequestError,
    redirects::RedirectBack,
    uploads::{allowed_file, random_filename, remove_post_images, save_upload},
    AppContext,
};

type JsonResult<T> = Result<Json<T>, RequestError>;

// ----------------- Settings Handlers -----------------
pub async fn settings(
    session: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
) -> JsonResult<SettingsWrapper<AdminSettingsResponse>> {
    let admin = get_admin_by_id(&ctx.pool, session.id)
        .await?
        .ok_or(RequestError::NotFound("Admin not found"))?;
    Ok(Json(SettingsWrapper {
        settings: AdminSettingsResponse::new(admin),
    }))
}

pub async fn update_settings(
    session: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(SettingsWrapper { settings }): Json<SettingsWrapper<SettingsRequest>>,
) -> Result<Redirect, RequestError> {
    settings.validate()?;
    update_settings_in_db(&ctx.pool, session.id, settings).await?;
    Ok(Redirect::to("/"))
}

// ----------------- Post Handlers -----------------
pub async fn manage_posts(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<PageQueryParams>,
) -> Result<Response, RequestError> {
    let posts = list_posts(
        &ctx.pool,
        PageRequest::new(params.page, ctx.config.manage_post_per_page),
    )
    .await?;
    if posts.page > posts.last_page() {
        let target = format!("/admin/post/manage?page={}", posts.last_page());
        return Ok(Redirect::to(&target).into_response());
    }
    Ok(Json(MultiplePostsWrapper { posts }).into_response())
}

pub async fn new_post(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(PostWrapper { post }): Json<PostWrapper<PostRequest>>,
) -> Result<Redirect, RequestError> {
    post.validate()?;
    let post = create_post_in_db(&ctx.pool, post).await?;
    tracing::info!(post = post.id, "post created");
    Ok(Redirect::to(&format!("/post/{}", post.id)))
}

/// Current values of a post, for filling the edit form.
pub async fn post_form(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(post_id): Path<i64>,
) -> JsonResult<PostWrapper<PostRequest>> {
    let post = get_post_by_id(&ctx.pool, post_id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))?;
    Ok(Json(PostWrapper {
        post: PostRequest {
            title: post.title,
            body: post.body,
            category: post.category_id,
        },
    }))
}

pub async fn edit_post(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(post_id): Path<i64>,
    Json(PostWrapper { post }): Json<PostWrapper<PostRequest>>,
) -> Result<Redirect, RequestError> {
    post.validate()?;
    let post = update_post_in_db(&ctx.pool, post_id, post).await?;
    Ok(Redirect::to(&format!("/post/{}", post.id)))
}

pub async fn delete_post(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
    Path(post_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    let post = delete_post_in_db(&ctx.pool, post_id).await?;
    remove_post_images(&ctx.config.upload_path, &post.body).await;
    Ok(back.to("/"))
}

pub async fn set_comment(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
    Path(post_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    let post = toggle_no_comment_in_db(&ctx.pool, post_id).await?;
    tracing::info!(post = post.id, disabled = post.no_comment, "comment setting changed");
    Ok(back.to("/"))
}

// ----------------- Comment Handlers -----------------
pub async fn manage_comments(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Query(params): Query<CommentManageQueryParams>,
) -> Result<Response, RequestError> {
    let filter = CommentFilter::from_param(params.filter.as_deref());
    let comments = list_comments_for_review(
        &ctx.pool,
        filter,
        PageRequest::new(params.page, ctx.config.comment_per_page),
    )
    .await?;
    if comments.page > comments.last_page() {
        let target = format!(
            "/admin/comment/manage?page={}&filter={}",
            comments.last_page(),
            filter.as_param()
        );
        return Ok(Redirect::to(&target).into_response());
    }
    Ok(Json(MultipleCommentsWrapper {
        filter: filter.as_param(),
        comments,
    })
    .into_response())
}

pub async fn approve_comment(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
    Path(comment_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    approve_comment_in_db(&ctx.pool, comment_id).await?;
    Ok(back.to("/"))
}

pub async fn approve_all_comments(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
) -> Result<Redirect, RequestError> {
    approve_all_pending_in_db(&ctx.pool).await?;
    Ok(back.to("/"))
}

pub async fn delete_comment(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    back: RedirectBack,
    Path(comment_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    delete_comment_in_db(&ctx.pool, comment_id).await?;
    Ok(back.to("/"))
}

// ----------------- Category Handlers -----------------
pub async fn manage_categories(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
) -> JsonResult<MultipleCategoriesWrapper> {
    let categories = list_categories(&ctx.pool).await?;
    Ok(Json(MultipleCategoriesWrapper { categories }))
}

pub async fn new_category(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(CategoryWrapper { category: request }): Json<CategoryWrapper<CategoryRequest>>,
) -> Result<Redirect, RequestError> {
    request.validate()?;
    create_category_in_db(&ctx.pool, request).await?;
    Ok(Redirect::to("/admin/category/manage"))
}

pub async fn edit_category(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(category_id): Path<i64>,
    Json(CategoryWrapper { category: request }): Json<CategoryWrapper<CategoryRequest>>,
) -> Result<Redirect, RequestError> {
    request.validate()?;
    rename_category_in_db(&ctx.pool, category_id, request).await?;
    Ok(Redirect::to("/admin/category/manage"))
}

pub async fn delete_category(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(category_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    if delete_category_in_db(&ctx.pool, category_id).await? {
        Ok(Redirect::to("/admin/category/manage"))
    } else {
        Err(RequestError::Forbidden(
            "You can not delete the default category.",
        ))
    }
}

// ----------------- Link Handlers -----------------
pub async fn manage_links(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
) -> JsonResult<MultipleLinksWrapper> {
    let links = list_links(&ctx.pool).await?;
    Ok(Json(MultipleLinksWrapper { links }))
}

pub async fn new_link(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Json(LinkWrapper { link: request }): Json<LinkWrapper<LinkRequest>>,
) -> Result<Redirect, RequestError> {
    request.validate()?;
    create_link_in_db(&ctx.pool, request).await?;
    Ok(Redirect::to("/admin/link/manage"))
}

pub async fn edit_link(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(link_id): Path<i64>,
    Json(LinkWrapper { link: request }): Json<LinkWrapper<LinkRequest>>,
) -> Result<Redirect, RequestError> {
    request.validate()?;
    update_link_in_db(&ctx.pool, link_id, request).await?;
    Ok(Redirect::to("/admin/link/manage"))
}

pub async fn delete_link(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    Path(link_id): Path<i64>,
) -> Result<Redirect, RequestError> {
    delete_link_in_db(&ctx.pool, link_id).await?;
    Ok(Redirect::to("/admin/link/manage"))
}

// ----------------- Upload Handlers -----------------
pub async fn upload_image(
    _: AdminSession,
    Extension(ctx): Extension<Arc<AppContext>>,
    mut multipart: Multipart,
) -> JsonResult<UploadResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| RequestError::BadRequest("Malformed upload."))?
    {
        if field.name() != Some("upload") {
            continue;
        }
        let original = field.file_name().unwrap_or_default().to_string();
        if !allowed_file(&ctx.config, &original) {
            return Err(RequestError::BadRequest("Image only!"));
        }
        let data = field
            .bytes()
            .await
            .map_err(|_| RequestError::BadRequest("Malformed upload."))?;
        let filename = random_filename(&original);
        save_upload(&ctx.config.upload_path, &filename, &data)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "could not store upload");
                RequestError::ServerError
            })?;
        tracing::info!(filename = %filename, size = data.len(), "image uploaded");
        return Ok(Json(UploadResponse::new(filename)));
    }
    Err(RequestError::BadRequest("No file uploaded."))
}
