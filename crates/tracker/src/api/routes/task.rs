use crate::api::server::AppState;
use crate::store::domains::task_store::TaskStoreError;
use actix_web::{
    http::StatusCode,
    web::{self, delete, get, post, put, Data, ReqData},
    HttpResponse, Scope,
};
use log::{debug, info};
use shared::models::api::ErrorResponse;
use shared::models::task::{TaskRequest, TaskUpdate};
use shared::security::bearer_auth_middleware::AuthenticatedUser;

fn error_response(err: TaskStoreError) -> HttpResponse {
    let status = match err {
        TaskStoreError::NotFound => StatusCode::NOT_FOUND,
        TaskStoreError::Validation(_) => StatusCode::BAD_REQUEST,
    };
    ErrorResponse::new(err.to_string()).with_status(status)
}

async fn get_tasks(user: ReqData<AuthenticatedUser>, app_state: Data<AppState>) -> HttpResponse {
    let task_store = app_state.store_context.task_store.clone();
    let tasks = task_store.get_user_tasks(&user.user_id);
    debug!(
        "GET /api/tasks - user: {}, found: {} tasks",
        user.user_id,
        tasks.len()
    );
    HttpResponse::Ok().json(tasks)
}

async fn get_task(
    id: web::Path<String>,
    user: ReqData<AuthenticatedUser>,
    app_state: Data<AppState>,
) -> HttpResponse {
    let task_store = app_state.store_context.task_store.clone();
    match task_store.get_task(&user.user_id, &id) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(err) => error_response(err),
    }
}

async fn create_task(
    task: web::Json<TaskRequest>,
    user: ReqData<AuthenticatedUser>,
    app_state: Data<AppState>,
) -> HttpResponse {
    let task_store = app_state.store_context.task_store.clone();
    match task_store.add_task(&user.user_id, task.into_inner()) {
        Ok(task) => {
            info!(
                "Created task {} for user {} ({} tasks in store)",
                task.id,
                user.user_id,
                task_store.task_count()
            );
            HttpResponse::Created().json(task)
        }
        Err(err) => error_response(err),
    }
}

async fn update_task(
    id: web::Path<String>,
    update: web::Json<TaskUpdate>,
    user: ReqData<AuthenticatedUser>,
    app_state: Data<AppState>,
) -> HttpResponse {
    let task_store = app_state.store_context.task_store.clone();
    match task_store.update_task(&user.user_id, &id, update.into_inner()) {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(err) => error_response(err),
    }
}

async fn delete_task(
    id: web::Path<String>,
    user: ReqData<AuthenticatedUser>,
    app_state: Data<AppState>,
) -> HttpResponse {
    let task_store = app_state.store_context.task_store.clone();
    match task_store.delete_task(&user.user_id, &id) {
        Ok(()) => {
            info!("Deleted task {} for user {}", id, user.user_id);
            HttpResponse::NoContent().finish()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) fn tasks_routes() -> Scope {
    web::scope("/api/tasks")
        .route("", get().to(get_tasks))
        .route("", post().to(create_task))
        .route("/{id}", get().to(get_task))
        .route("/{id}", put().to(update_task))
        .route("/{id}", delete().to(delete_task))
}
