use rocket::{
    data::{Data, ToByteUnit},
    http::{ContentType, Status},
    serde::json::Json,
    tokio::time::sleep,
    Route, State,
};

use crate::{
    analysis::{
        CleanAction, CleanSummary, ModelKind, ModelMetrics, TestSplit, TrainRequest,
        TrainingProgress, TrainingReport, UploadSummary, METRICS_FILE_NAME, PROGRESS_STEP,
    },
    api::admin::Attachment,
    error::{Error, Result},
    model::auth::AdminAuth,
    state::SharedAnalysis,
    Config,
};

pub fn routes() -> Vec<Route> {
    routes![upload, clean, train, progress, export_metrics]
}

#[post("/analysis/upload", data = "<csv>")]
pub async fn upload(
    _admin: AdminAuth,
    csv: Data<'_>,
    analysis: &State<SharedAnalysis>,
    config: &State<Config>,
) -> Result<Json<UploadSummary>> {
    let text = csv
        .open(config.upload_limit_kib().kibibytes())
        .into_string()
        .await
        .map_err(|e| Error::bad_request(format!("Could not read upload: {e}")))?;
    if !text.is_complete() {
        return Err(Error::Status(
            Status::PayloadTooLarge,
            "CSV file is too large".to_string(),
        ));
    }
    let summary = analysis
        .lock()
        .await
        .upload(&text.into_inner(), config.preview_rows())?;
    Ok(Json(summary))
}

#[post("/analysis/clean/<action>")]
pub async fn clean(
    _admin: AdminAuth,
    action: &str,
    analysis: &State<SharedAnalysis>,
) -> Result<Json<CleanSummary>> {
    let action: CleanAction = action.parse()?;
    Ok(Json(analysis.lock().await.clean(action)?))
}

#[post("/analysis/train", data = "<request>", format = "json")]
pub async fn train(
    _admin: AdminAuth,
    request: Json<TrainRequest>,
    analysis: &State<SharedAnalysis>,
    config: &State<Config>,
) -> Result<Json<TrainingReport>> {
    let model: ModelKind = request.model.parse()?;
    let split: TestSplit = request.test_split.parse()?;
    analysis.lock().await.begin_training(model, split)?;

    // The lock is only held while moving the progress bar, so progress can be polled.
    let steps = 100 / u32::from(PROGRESS_STEP);
    let step = config.training_duration() / steps;
    for _ in 0..steps {
        sleep(step).await;
        analysis.lock().await.advance();
    }

    // Scoped so the thread-local RNG is dropped before the next `await`.
    let metrics = {
        let mut rng = rand::thread_rng();
        ModelMetrics::random(&mut rng)
    };
    analysis
        .lock()
        .await
        .finish_training(metrics)
        .map(Json)
        .ok_or_else(|| Error::Status(Status::Conflict, "Training was interrupted".to_string()))
}

#[get("/analysis/progress")]
pub async fn progress(_admin: AdminAuth, analysis: &State<SharedAnalysis>) -> Json<TrainingProgress> {
    Json(analysis.lock().await.progress())
}

#[get("/analysis/export")]
pub async fn export_metrics(
    _admin: AdminAuth,
    analysis: &State<SharedAnalysis>,
) -> Result<Attachment> {
    let csv = analysis
        .lock()
        .await
        .metrics_csv()
        .ok_or_else(|| Error::not_found("Trained model"))?;
    Ok(Attachment::new(
        csv.into_bytes(),
        ContentType::CSV,
        METRICS_FILE_NAME,
    ))
}
