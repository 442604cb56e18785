use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, get, web};
use chrono::{DateTime, NaiveDate};
use log::error;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::RateError;
use crate::resolver::RateResolver;

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub currency: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl ResponseError for RateError {
    fn status_code(&self) -> StatusCode {
        match self {
            RateError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            RateError::Store(e) => {
                error!("Rate store failure: {}", e);
                "Internal server error".to_string()
            }
            RateError::ResolutionExhausted { .. } | RateError::SettlementCurrency(_) => {
                format!("Could not fetch exchange rate: {}", self)
            }
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { message })
    }
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate, RateError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| RateError::InvalidDate(value.to_string()))
}

#[get("/exchange-rates")]
async fn get_exchange_rate(
    resolver: web::Data<RateResolver>,
    query: web::Query<RateQuery>,
) -> Result<HttpResponse, RateError> {
    let currency: Currency = query.currency.parse()?;
    let date = parse_date(&query.date)?;

    let rate = resolver.resolve(currency, date).await?;

    Ok(HttpResponse::Ok().json(rate))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_exchange_rate).service(health);
}
