/// 存活探针
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "系统 (System)",
    responses(
        (status = 200, description = "服务存活", body = String, example = "ok")
    )
)]
pub async fn healthz() -> &'static str {
    "ok"
}
