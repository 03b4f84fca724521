//! Built-in document schemas.

use serde_json::{Map, Value};

use super::dates::parse_date;
use super::{FieldDefault, FieldKind, FieldSpec, Schema};
use crate::error::Violation;

/// Driving license or state ID card.
pub static DRIVING_LICENSE: Schema = Schema {
    name: "DrivingLicense",
    fields: &[
        FieldSpec::required("name", FieldKind::String, "Full name as shown on the license"),
        FieldSpec::optional(
            "date_of_birth",
            FieldKind::Date,
            "Date of birth of the license holder in MM/DD/YYYY format. If not visible, set to null.",
        ),
        FieldSpec::required(
            "license_number",
            FieldKind::String,
            "The driver's license or ID card number.",
        ),
        FieldSpec::required(
            "issuing_state",
            FieldKind::String,
            "The state or jurisdiction that issued the license.",
        ),
        FieldSpec::optional(
            "expiry_date",
            FieldKind::Date,
            "The date the license expires in MM/DD/YYYY format. If not visible, set to null.",
        ),
    ],
    rules: &[birth_before_expiry],
};

/// One purchased item on a receipt.
pub static LINE_ITEM: Schema = Schema {
    name: "LineItem",
    fields: &[
        FieldSpec::required("ItemName", FieldKind::String, "The name of the purchased item."),
        FieldSpec::optional(
            "Quantity",
            FieldKind::Number,
            "The quantity of the item purchased.",
        )
        .with_default(FieldDefault::Number(1.0)),
        FieldSpec::optional("Price", FieldKind::Number, "The price of the single item."),
    ],
    rules: &[],
};

/// Shop receipt.
pub static SHOP_RECEIPT: Schema = Schema {
    name: "ShopReceipt",
    fields: &[
        FieldSpec::optional(
            "MerchantName",
            FieldKind::String,
            "The name of the store or merchant.",
        ),
        FieldSpec::optional(
            "TotalAmount",
            FieldKind::Number,
            "The final total amount of the purchase.",
        ),
        FieldSpec::optional(
            "DateOfPurchase",
            FieldKind::Date,
            "The date of the transaction in MM/DD/YYYY format.",
        ),
        FieldSpec::optional(
            "PaymentMethod",
            FieldKind::String,
            "How payment was made (e.g., Credit Card, Cash).",
        ),
        FieldSpec::optional(
            "LineItems",
            FieldKind::ObjectList(&LINE_ITEM),
            "A list of all items purchased.",
        ),
    ],
    rules: &[],
};

/// One job on a resume.
pub static WORK_EXPERIENCE: Schema = Schema {
    name: "WorkExperience",
    fields: &[
        FieldSpec::required("company", FieldKind::String, "The name of the company."),
        FieldSpec::required(
            "role",
            FieldKind::String,
            "The role of the candidate in the company.",
        ),
        FieldSpec::optional(
            "dates",
            FieldKind::String,
            "The dates of the work experience in MM/DD/YYYY format.",
        ),
    ],
    rules: &[],
};

/// One degree on a resume.
pub static EDUCATION: Schema = Schema {
    name: "Education",
    fields: &[
        FieldSpec::required("institution", FieldKind::String, "The name of the institution."),
        FieldSpec::required("degree", FieldKind::String, "The degree of the candidate."),
        FieldSpec::optional(
            "graduation_year",
            FieldKind::String,
            "The graduation year of the candidate in YYYY format.",
        ),
    ],
    rules: &[],
};

/// Resume / CV.
pub static RESUME: Schema = Schema {
    name: "Resume",
    fields: &[
        FieldSpec::optional("full_name", FieldKind::String, "The full name of the candidate."),
        FieldSpec::optional("email", FieldKind::String, "The email address of the candidate."),
        FieldSpec::optional(
            "phone_number",
            FieldKind::String,
            "The phone number of the candidate.",
        ),
        FieldSpec::optional(
            "skills",
            FieldKind::StringList,
            "The list of skills of the candidate. If not visible, set to empty list [].",
        ),
        FieldSpec::optional(
            "work_experience",
            FieldKind::ObjectList(&WORK_EXPERIENCE),
            "The list of work experience of the candidate. If not visible, set to empty list [].",
        ),
        FieldSpec::optional(
            "education",
            FieldKind::ObjectList(&EDUCATION),
            "The list of education of the candidate. If not visible, set to empty list [].",
        ),
    ],
    rules: &[],
};

/// Date of birth must fall strictly before the expiry date when both are known.
fn birth_before_expiry(record: &Map<String, Value>) -> Result<(), Violation> {
    let dob = record.get("date_of_birth").and_then(Value::as_str);
    let expiry = record.get("expiry_date").and_then(Value::as_str);

    let (Some(dob), Some(expiry)) = (dob, expiry) else {
        return Ok(());
    };
    let (Some(born), Some(expires)) = (parse_date(dob), parse_date(expiry)) else {
        return Ok(());
    };

    if born >= expires {
        return Err(Violation::new(
            "date_of_birth",
            format!("Date of birth '{dob}' must be before the expiry date '{expiry}'"),
        ));
    }
    Ok(())
}
