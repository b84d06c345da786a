use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const USER_ACTIVE: &str = "active";
pub const PROFESSIONAL_ACTIVE: &str = "active";
pub const SERVICE_ACTIVE: &str = "active";

/// Display fallback when a professional has no service areas on record.
pub const DEFAULT_REGION: &str = "Kerala";

pub const SERVICE_CATEGORIES: [&str; 8] = [
    "home-maintenance",
    "cleaning",
    "repair",
    "installation",
    "personal-care",
    "automotive",
    "gardening",
    "healthcare",
];

pub fn is_valid_category(category: &str) -> bool {
    SERVICE_CATEGORIES.contains(&category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Customer,
    Professional,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Professional => "professional",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(UserType::Customer),
            "professional" => Some(UserType::Professional),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Disputed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
            BookingStatus::Disputed => "disputed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "in-progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "no-show" => Some(BookingStatus::NoShow),
            "disputed" => Some(BookingStatus::Disputed),
            _ => None,
        }
    }

    /// Forward-only transition table. Cancelled and disputed are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, Completed)
                | (InProgress, Disputed)
                | (Completed, Disputed)
                | (NoShow, Disputed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Card => "card",
            PaymentMethod::Wallet => "wallet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cash" => Some(PaymentMethod::Cash),
            "upi" => Some(PaymentMethod::Upi),
            "card" => Some(PaymentMethod::Card),
            "wallet" => Some(PaymentMethod::Wallet),
            _ => None,
        }
    }
}

/// Running rating aggregate with a 1-5 star histogram. The average is always
/// the weighted mean of the histogram and the bucket sum equals the count.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i64,
    pub histogram: [i64; 5],
}

impl RatingAggregate {
    pub fn new(average: f64, count: i64, histogram: [i64; 5]) -> Self {
        Self {
            average,
            count,
            histogram,
        }
    }

    /// O(1) incremental update: no rescan of historical ratings.
    pub fn apply(&mut self, rating: u8) {
        debug_assert!((1..=5).contains(&rating));
        let total = self.average * self.count as f64 + f64::from(rating);
        self.count += 1;
        self.average = total / self.count as f64;
        self.histogram[usize::from(rating) - 1] += 1;
    }
}

/// Total amount for a booking: hourly rate times the estimated duration in
/// hours, defaulting to a single hour when no estimate was given.
pub fn booking_total(hourly_rate: f64, estimated_duration_min: Option<i64>) -> f64 {
    let hours = match estimated_duration_min {
        Some(minutes) => minutes as f64 / 60.0,
        None => 1.0,
    };
    hourly_rate * hours
}

/// Human-readable booking code, assigned once at creation.
pub fn new_booking_code() -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..5].to_uppercase();
    format!("BK{}{}", Utc::now().timestamp_millis(), suffix)
}

pub fn new_ticket_code() -> String {
    format!("TK{}", Utc::now().timestamp_millis())
}

/// Deterministic URL slug: lowercase, runs of non-alphanumerics collapse to a
/// single dash, no leading or trailing dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut dash_pending = false;
    for ch in name.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            if dash_pending && !slug.is_empty() {
                slug.push('-');
            }
            dash_pending = false;
            slug.push(ch);
        } else {
            dash_pending = true;
        }
    }
    slug
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub user_type: String,
    pub status: String,
    pub email_verified: i64,
    pub phone_verified: i64,
    pub login_attempts: i64,
    pub lock_until: Option<String>,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub icon: String,
    pub base_price: f64,
    pub price_unit: String,
    pub rating_average: f64,
    pub rating_count: i64,
    pub total_bookings: i64,
    pub featured: i64,
    pub popularity_score: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfessionalRow {
    pub id: String,
    pub user_id: String,
    pub business_name: Option<String>,
    pub description: Option<String>,
    pub experience_years: i64,
    pub current_status: String,
    pub identity_verification: String,
    pub background_verification: String,
    pub skills_verification: String,
    pub rating_average: f64,
    pub rating_count: i64,
    pub rating_1: i64,
    pub rating_2: i64,
    pub rating_3: i64,
    pub rating_4: i64,
    pub rating_5: i64,
    pub total_bookings: i64,
    pub completed_bookings: i64,
    pub cancelled_bookings: i64,
    pub completion_rate: f64,
    pub total_earnings: f64,
    pub status: String,
    pub revision: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfessionalRow {
    pub fn is_verified(&self) -> bool {
        self.identity_verification == "verified" && self.background_verification == "verified"
    }

    pub fn rating(&self) -> RatingAggregate {
        RatingAggregate::new(
            self.rating_average,
            self.rating_count,
            [
                self.rating_1,
                self.rating_2,
                self.rating_3,
                self.rating_4,
                self.rating_5,
            ],
        )
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferingRow {
    pub professional_id: String,
    pub service_id: String,
    pub hourly_rate: f64,
    pub experience_years: i64,
    pub specialties: String,
}

impl OfferingRow {
    pub fn specialties_vec(&self) -> Vec<String> {
        serde_json::from_str(&self.specialties).unwrap_or_default()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceAreaRow {
    pub professional_id: String,
    pub city: String,
    pub areas: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkingHourRow {
    pub professional_id: String,
    pub weekday: i64,
    pub start_time: String,
    pub end_time: String,
    pub available: i64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    pub booking_code: String,
    pub customer_id: String,
    pub professional_id: String,
    pub service_id: String,
    pub scheduled_date: String,
    pub slot_start: Option<String>,
    pub slot_end: Option<String>,
    pub estimated_duration_min: Option<i64>,
    pub address: String,
    pub city: String,
    pub instructions: Option<String>,
    pub base_amount: f64,
    pub additional_charges: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub total_amount: f64,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub customer_rating: Option<i64>,
    pub customer_review: Option<String>,
    pub customer_aspects: Option<String>,
    pub customer_feedback_at: Option<String>,
    pub professional_rating: Option<i64>,
    pub professional_review: Option<String>,
    pub professional_feedback_at: Option<String>,
    pub revision: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TimelineRow {
    pub id: String,
    pub booking_id: String,
    pub status: String,
    pub note: Option<String>,
    pub actor_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub booking_id: String,
    pub sender_id: String,
    pub body: String,
    pub kind: String,
    pub created_at: String,
}

/// Feedback aspect scores as accepted from customers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackAspects {
    pub punctuality: Option<u8>,
    pub quality: Option<u8>,
    pub behavior: Option<u8>,
    pub cleanliness: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("AC Repair & Service"), "ac-repair-service");
        assert_eq!(slugify("  Deep Cleaning  "), "deep-cleaning");
        assert_eq!(slugify("Plumbing"), "plumbing");
        assert_eq!(slugify("--weird--name--"), "weird-name");
    }

    #[test]
    fn booking_total_uses_duration_in_hours() {
        assert_eq!(booking_total(300.0, Some(120)), 600.0);
        assert_eq!(booking_total(300.0, Some(30)), 150.0);
    }

    #[test]
    fn booking_total_defaults_to_one_hour() {
        assert_eq!(booking_total(450.0, None), 450.0);
    }

    #[test]
    fn rating_update_is_incremental() {
        let mut rating = RatingAggregate::new(4.8, 156, [2, 3, 6, 12, 133]);
        rating.apply(5);
        assert_eq!(rating.count, 157);
        assert!((rating.average - (4.8 * 156.0 + 5.0) / 157.0).abs() < 1e-9);
        assert_eq!(rating.histogram[4], 134);
    }

    #[test]
    fn rating_updates_are_order_independent() {
        let mut a = RatingAggregate::new(0.0, 0, [0; 5]);
        let mut b = RatingAggregate::new(0.0, 0, [0; 5]);
        for r in [5u8, 3, 4] {
            a.apply(r);
        }
        for r in [3u8, 4, 5] {
            b.apply(r);
        }
        assert!((a.average - b.average).abs() < 1e-9);
        assert_eq!(a.count, b.count);
        assert_eq!(a.histogram, b.histogram);
    }

    #[test]
    fn histogram_sum_matches_count() {
        let mut rating = RatingAggregate::new(0.0, 0, [0; 5]);
        for r in [1u8, 2, 5, 5, 4, 3, 5] {
            rating.apply(r);
        }
        let sum: i64 = rating.histogram.iter().sum();
        assert_eq!(sum, rating.count);
        assert!(rating.average >= 1.0 && rating.average <= 5.0);
    }

    #[test]
    fn transitions_follow_the_table() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Disputed));

        // No moving backward and no leaving terminal states.
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Disputed.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
            BookingStatus::Disputed,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("unknown"), None);
    }

    #[test]
    fn booking_codes_carry_the_prefix() {
        let code = new_booking_code();
        assert!(code.starts_with("BK"));
        assert!(code.len() > 10);
    }
}
