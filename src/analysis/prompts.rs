//! Extraction prompts per document kind.

use crate::models::DocumentKind;

/// Prepended to every request; the generate endpoint has no system role.
pub const SYSTEM_PREAMBLE: &str =
    "You are an AI assistant that extracts structured information from documents.\n\n";

const BUSINESS_LICENSE_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "client_name": "The name of the business entity",
  "client_type": "Classify as either 'corporate_entity' or 'private_individual' using the rules below",
  "tax_code_mst": "The tax code or business registration number",
  "business_license_gpkd": "Whether a business license exists (yes/no/na)",
  "business_address": "The registered business address",
  "registered_share_capital": "The registered share capital amount in VND (numeric value only)",
  "business_operations": "Description of the business operations",
  "customer_type": "Choose from: manufacturing_production, trading_commercial, construction_real_estate, services, agriculture_forestry_fishery, technology_it_software, energy_utilities, finance_insurance_banking, healthcare_pharmaceuticals, media_entertainment, or na_private_individual",
  "incorporation_date": "The date of incorporation in YYYY-MM-DD format",
  "owners_name": "The name of the primary owner or major shareholder",
  "ownership_category": "Ownership percentage category (100, gt_50, lt_50, or na)",
  "key_decision_maker": "The name of the person with the largest ownership percentage in the company"
}

For client_type, use ONLY the text of the business license and apply these rules in order:
1) A registered company form ("Công ty TNHH", "Công ty cổ phần", "Công ty hợp danh", "LLC", "Company Limited", "Ltd.", "Inc.", "Corp.", "GmbH", "PLC", "LLP") means "corporate_entity".
2) "Hộ kinh doanh", "Doanh nghiệp tư nhân (DNTN)", a sole proprietorship, or an individual owner with only a trade name means "private_individual".
3) A branch or representative office of a company ("Chi nhánh", "Văn phòng đại diện") is still "corporate_entity".
4) On conflicting signals prefer the enterprise type field ("Loại hình doanh nghiệp") over legal name suffixes over the owner section.
5) A person's name with an Owner field and no company form means "private_individual".

For customer_type, choose the category that best describes the company's main business:
- "manufacturing_production": produces, manufactures or assembles physical goods
- "trading_commercial": buys and sells goods, import/export, wholesale, retail
- "construction_real_estate": construction, real estate development, property management
- "services": consulting, legal, accounting, cleaning and other general services
- "agriculture_forestry_fishery": farming, forestry, fishing, food production
- "technology_it_software": software, IT services, digital services
- "energy_utilities": power generation, oil and gas, utilities, renewables
- "finance_insurance_banking": banks, insurance, financial services, investment
- "healthcare_pharmaceuticals": hospitals, clinics, pharmaceuticals, medical services
- "media_entertainment": media, entertainment, advertising, publishing
- "na_private_individual": private individuals or undeterminable

For key_decision_maker, find the person with the highest share of ownership in the shareholder, owner, member or capital contribution sections and give their full name."#;

const EVN_BILL_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "billing_address": "The address on the EVN bill",
  "billing_address_matches_client": "Whether the billing address matches the client's business address (yes/no). BE GENEROUS in matching: differences in formatting, abbreviations, punctuation or word order are a MATCH.",
  "billing_amount": "The billing amount in VND (numeric value only)",
  "billed_amounts_match_expenses": "Compare the billed amounts with expense figures in the financial statement (energy costs, cost of goods sold, operating expenses). A difference within ±5%, or equal amounts when rounded to the nearest million VND, is a match. Return yes, no, or na when it cannot be determined."
}

Address matching rules:
- Treat as the same location despite different abbreviations (St/Street, Ave/Avenue, Dist/District, Ward/W), punctuation, word order, letter case, spacing or minor spelling variations.
- Only answer "no" when the addresses clearly refer to different locations.

Examples:
- "123 Main Street, District 1, HCMC" vs "123 Main St, Dist 1, Ho Chi Minh City" -> yes
- "789 Le Loi Ave, Tan Binh" vs "789 Le Loi Avenue, Tan Binh District" -> yes
- "123 Main Street, District 1" vs "456 Other Street, District 2" -> no
- "789 Le Loi, Tan Binh" vs "789 Le Loi, District 7" -> no"#;

const LAND_CERTIFICATE_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "situation": "Land ownership situation (land_owner, rental_agreement, or unknown)",
  "landowner_is_signatory": "Whether the landowner/tenant is the contract signatory (yes/no)",
  "documentation_complete": "Whether the ownership documentation is complete (yes/no) (only if situation is land_owner)",
  "lease_expiration_date": "The expiration date of the lease in YYYY-MM-DD format (only if situation is rental_agreement)"
}

Every field must have a value. Answer "no" for landowner_is_signatory and documentation_complete when it cannot be determined, and use "0000-00-00" for lease_expiration_date when no date is found.

Classify situation from the document TITLE only:
- "land_owner": "Giấy chứng nhận quyền sử dụng đất", "GCN QSDĐ", "Sổ đỏ", "Sổ hồng", "Certificate of Land Use Rights", "Land Title", "Title Deed", "Quyết định giao đất"
- "rental_agreement": "Hợp đồng thuê đất", "Hợp đồng thuê lại đất", "Hợp đồng cho thuê quyền sử dụng đất", "Land Lease Agreement", "Sublease Agreement", "Premises Lease", "Quyết định cho thuê đất"
- "unknown": generic or unrelated titles such as "Biên bản" or "Giấy phép xây dựng"
If both ownership and lease terms appear, prefer the more specific land term; if still unclear, choose "unknown"."#;

const ID_CHECK_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "company_director_name": "The name of the company director",
  "key_decision_maker": "The name of the key decision maker"
}"#;

const SITE_VISIT_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "company_signboard": "Status of the company signboard (available_matches_client_info, available_does_not_match_client_info, or not_available_or_not_checked)"
}

- "available_matches_client_info": a signboard is clearly visible and its company name matches the client name
- "available_does_not_match_client_info": a signboard is clearly visible but the name does not match
- "not_available_or_not_checked": no signboard is visible, or it is too unclear to read
Spelling, abbreviation and formatting variations ("ABC Co., Ltd." vs "ABC Company Limited") still match."#;

const FINANCIAL_STATEMENT_FIELDS: &str = r#"Please extract the following fields in JSON format:
{
  "financial_statement_date": "Date of the financial statements in YYYY-MM-DD format",
  "total_revenues": "Array of 5 numbers for total revenues in VND: [30/06/25, 31/12/24, 30/6/24, 31/12/23, 30/6/23]",
  "total_costs": "Array of 5 numbers for total costs in VND: [30/06/25, 31/12/24, 30/6/24, 31/12/23, 30/6/23]",
  "total_energy_costs": "Array of 5 numbers for total energy costs in VND: [30/06/25, 31/12/24, 30/6/24, 31/12/23, 30/6/23]",
  "total_assets": "Array of 5 numbers for total assets in VND: [30/06/25, 31/12/24, 30/6/24, 31/12/23, 30/6/23]",
  "total_debt": "Array of 5 numbers for total debt in VND: [30/06/25, 31/12/24, 30/6/24, 31/12/23, 30/6/23]"
}

Periods are ordered most recent first. All amounts are integers in VND. Use 0 for periods without data."#;

const CIC_REPORT_FIELDS: &str = r#"Please extract ALL loans and credit facilities in this CIC report and return them as an array in JSON format:
{
  "loans": [
    {
      "payment_history": "Description of payment history and repayment behavior",
      "loan_type": "short_term_loan, medium_term_loan, long_term_loan, credit_card, overdrafts, guarantee, financial_leasing, factoring, consumer_loan, or other_credit_facility",
      "debt_classification": "group_1_current_debt, group_2_special_mention_debt, group_3_substandard_debt, group_4_doubtful_debt, or group_5_loss_debt",
      "outstanding_amount": "Outstanding loan amount in VND (numeric value only)",
      "annual_interest_cost": "Annual interest cost in VND (numeric value only)",
      "annual_amortization": "Annual amortization amount in VND (numeric value only)",
      "maturity": "Loan maturity date in YYYY-MM-DD format"
    }
  ]
}

Return {"loans": []} when no loans are found. Defaults for missing information: loan_type "other_credit_facility", debt_classification "group_1_current_debt", amounts 0, maturity "0000-00-00", payment_history "No payment history found".

Search every section (balance sheet, notes, credit information) for loans, credit, debt, borrowing or financing, including the Vietnamese terms khoản vay, tín dụng, nợ, vay vốn and tài trợ.

Debt groups: group 1 on time or overdue up to 10 days (Nợ đủ tiêu chuẩn); group 2 overdue 11-90 days (Nợ cần chú ý); group 3 overdue 91-180 days (Nợ dưới tiêu chuẩn); group 4 overdue 181-360 days (Nợ nghi ngờ); group 5 overdue more than 360 days or written off (Nợ có khả năng mất vốn)."#;

const GENERIC_FIELDS: &str =
    "Please extract any relevant information in JSON format that might be useful for customer verification.";

/// Build the extraction prompt for a document of the given kind.
pub fn build_prompt(kind: DocumentKind, text: &str) -> String {
    let fields = match kind {
        DocumentKind::BusinessLicense => BUSINESS_LICENSE_FIELDS,
        DocumentKind::EvnBill => EVN_BILL_FIELDS,
        DocumentKind::LandCertificate => LAND_CERTIFICATE_FIELDS,
        DocumentKind::IdCheck => ID_CHECK_FIELDS,
        DocumentKind::SiteVisitPhotos => SITE_VISIT_FIELDS,
        DocumentKind::FinancialStatement => FINANCIAL_STATEMENT_FIELDS,
        DocumentKind::CicReport => CIC_REPORT_FIELDS,
        DocumentKind::CicReport2 | DocumentKind::Unknown => GENERIC_FIELDS,
    };

    format!(
        "Please analyze the following document text and extract the relevant information in JSON format. The document is a {}.\n\nDocument text:\n{}\n\n{}",
        kind, text, fields
    )
}

/// Prompt asking whether two addresses name the same place.
pub fn address_comparison_prompt(first: &str, second: &str) -> String {
    format!(
        r#"Compare these two addresses and determine if they refer to the same location:

Address 1: "{}"
Address 2: "{}"

Rules:
- BE GENEROUS in matching
- Ignore minor differences in formatting, abbreviations, punctuation, word order
- Consider these as MATCHES: "Street" vs "St", "District" vs "Dist", "Ward" vs "W", "Ho Chi Minh City" vs "HCMC"
- Only answer "no" if the addresses clearly refer to different locations

Respond in JSON format: {{"addresses_match": "yes"}} or {{"addresses_match": "no"}}"#,
        first, second
    )
}
