use anyhow::Result;
use chrono::{Local, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde_json::json;
use shared::{
    ApplyLoanRequest, LoanApplication, LoanDetailResponse, LoanPayment, LoanRelease, LoanStatus, LoanType,
    LoanableAmountResponse, PageResponse, RecordPaymentRequest, ReleaseLoanRequest, ReviewLoanRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use super::activity_log_service::ActivityLogService;
use super::commands::loans::LoanListQuery;
use super::contribution_service::ContributionService;
use super::context::MemberContext;
use super::eligibility_service::EligibilityService;
use super::errors::DomainError;
use super::loanable::{calculate_loanable, percentage_of};
use super::models::activity_log::{actions, entities};
use super::models::loan::{
    due_date, ensure_transition, outstanding_balance, LoanApplicationChanges, NewLoanApplicationRow,
    NewLoanPaymentRow, NewLoanReleaseRow, MAX_TERM_MONTHS, MIN_TERM_MONTHS,
};
use super::settings::SettingsService;
use crate::backend::storage::{LoanStorage, MemberStorage};

const MAX_PURPOSE_LENGTH: usize = 500;

/// Service for the loan lifecycle: application, review, release and repayment
#[derive(Clone)]
pub struct LoanService {
    loans: Arc<dyn LoanStorage>,
    members: Arc<dyn MemberStorage>,
    contributions: ContributionService,
    eligibility: EligibilityService,
    settings: SettingsService,
    activity: ActivityLogService,
}

impl LoanService {
    pub fn new(
        loans: Arc<dyn LoanStorage>,
        members: Arc<dyn MemberStorage>,
        contributions: ContributionService,
        eligibility: EligibilityService,
        settings: SettingsService,
        activity: ActivityLogService,
    ) -> Self {
        Self {
            loans,
            members,
            contributions,
            eligibility,
            settings,
            activity,
        }
    }

    async fn load_loan(&self, loan_id: Uuid) -> Result<LoanApplication> {
        Ok(self
            .loans
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Loan", loan_id))?)
    }

    /// How much `member_id` (or the caller) may borrow against share capital
    pub async fn loanable_amount(&self, ctx: &MemberContext, member_id: Option<Uuid>) -> Result<LoanableAmountResponse> {
        let member_id = member_id.unwrap_or(ctx.member_id);
        ctx.require_self_or_board(member_id)?;

        let share_capital_total = self.contributions.share_capital_total(member_id).await?;
        let percentage = self.settings.loan_settings().await?.share_capital_loanable_percentage;
        let loanable = calculate_loanable(share_capital_total, percentage);

        Ok(LoanableAmountResponse {
            member_id,
            share_capital_total,
            total_loanable: loanable.total_loanable,
            percentage: loanable.percentage,
        })
    }

    /// Apply for a loan; the member must pass the eligibility gate
    pub async fn apply_for_loan(&self, ctx: &MemberContext, request: ApplyLoanRequest) -> Result<LoanApplication> {
        let member_id = request.member_id.unwrap_or(ctx.member_id);
        ctx.require_self_or_board(member_id)?;
        info!(
            "Loan application by {}: {} {} over {} months",
            member_id,
            request.loan_type.as_str(),
            request.amount_requested,
            request.term_months
        );

        if request.amount_requested <= Decimal::ZERO {
            return Err(DomainError::validation("Loan amount must be positive").into());
        }
        if !(MIN_TERM_MONTHS..=MAX_TERM_MONTHS).contains(&request.term_months) {
            return Err(DomainError::validation(format!(
                "Loan term must be between {} and {} months",
                MIN_TERM_MONTHS, MAX_TERM_MONTHS
            ))
            .into());
        }
        let purpose = request.purpose.trim();
        if purpose.is_empty() {
            return Err(DomainError::validation("Loan purpose cannot be empty").into());
        }
        if purpose.chars().count() > MAX_PURPOSE_LENGTH {
            return Err(DomainError::validation(format!(
                "Loan purpose cannot exceed {} characters",
                MAX_PURPOSE_LENGTH
            ))
            .into());
        }

        let member = self
            .members
            .get_member(member_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Member", member_id))?;
        if member.is_archived() {
            return Err(DomainError::validation("Archived members cannot apply for loans").into());
        }

        let evaluation = self.eligibility.evaluate_member(&member).await?;
        if evaluation.has_restriction {
            warn!("Loan application by {} refused by eligibility gate", member_id);
            return Err(DomainError::Restricted(Box::new(evaluation.breakdown)).into());
        }

        if request.loan_type == LoanType::ShareCapital {
            let loanable = self.loanable_amount(ctx, Some(member_id)).await?;
            if request.amount_requested > loanable.total_loanable {
                return Err(DomainError::validation(format!(
                    "Requested amount {} exceeds loanable amount {}",
                    request.amount_requested, loanable.total_loanable
                ))
                .into());
            }
        }

        let row = NewLoanApplicationRow {
            member_id,
            loan_type: request.loan_type,
            amount_requested: request.amount_requested,
            term_months: request.term_months,
            purpose: purpose.to_string(),
            status: LoanStatus::Pending,
        };
        let loan = self.loans.insert_loan(&row).await?;

        self.activity
            .record(
                ctx,
                actions::LOAN_APPLIED,
                entities::LOAN,
                Some(loan.id),
                Some(json!({
                    "member_id": member_id,
                    "loan_type": loan.loan_type,
                    "amount_requested": loan.amount_requested,
                })),
            )
            .await;

        info!("Created loan application {}", loan.id);
        Ok(loan)
    }

    /// List loan applications; members only see their own
    pub async fn list_loans(&self, ctx: &MemberContext, mut query: LoanListQuery) -> Result<PageResponse<LoanApplication>> {
        query.member_id = ctx.scope_member(query.member_id)?;
        info!("Listing loans: member={:?}, status={:?}", query.member_id, query.status);

        let result = self.loans.list_loans(&query).await?;
        Ok(query.page.into_response(result.rows, result.total))
    }

    /// Application plus its release and payments
    pub async fn get_loan(&self, ctx: &MemberContext, loan_id: Uuid) -> Result<LoanDetailResponse> {
        let application = self.load_loan(loan_id).await?;
        ctx.require_self_or_board(application.member_id)?;

        let release = self.loans.get_release(loan_id).await?;
        let payments = self.loans.list_payments(loan_id).await?;
        let outstanding_balance = release
            .as_ref()
            .map(|release| outstanding_balance(release, &payments));

        Ok(LoanDetailResponse {
            application,
            release,
            payments,
            outstanding_balance,
        })
    }

    async fn review(
        &self,
        ctx: &MemberContext,
        loan_id: Uuid,
        to: LoanStatus,
        request: ReviewLoanRequest,
    ) -> Result<LoanApplication> {
        ctx.require_board("review loan applications")?;
        let loan = self.load_loan(loan_id).await?;
        ensure_transition(loan.status, to)?;

        let changes = LoanApplicationChanges {
            status: to,
            reviewed_by: Some(ctx.member_id),
            review_remarks: request
                .remarks
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            updated_at: Utc::now(),
        };
        let updated = self.loans.update_loan(loan_id, &changes).await?;

        let action = if to == LoanStatus::Approved {
            actions::LOAN_APPROVED
        } else {
            actions::LOAN_REJECTED
        };
        self.activity
            .record(
                ctx,
                action,
                entities::LOAN,
                Some(loan_id),
                Some(json!({ "remarks": updated.review_remarks })),
            )
            .await;

        info!("Loan {} moved to {}", loan_id, to);
        Ok(updated)
    }

    pub async fn approve_loan(&self, ctx: &MemberContext, loan_id: Uuid, request: ReviewLoanRequest) -> Result<LoanApplication> {
        self.review(ctx, loan_id, LoanStatus::Approved, request).await
    }

    pub async fn reject_loan(&self, ctx: &MemberContext, loan_id: Uuid, request: ReviewLoanRequest) -> Result<LoanApplication> {
        self.review(ctx, loan_id, LoanStatus::Rejected, request).await
    }

    /// Release an approved loan: fix interest, total payable and due date
    pub async fn release_loan(
        &self,
        ctx: &MemberContext,
        loan_id: Uuid,
        request: ReleaseLoanRequest,
    ) -> Result<LoanDetailResponse> {
        ctx.require_board("release loans")?;
        let loan = self.load_loan(loan_id).await?;
        ensure_transition(loan.status, LoanStatus::Released)?;

        // a release row left by an earlier attempt whose status update failed
        let release = match self.loans.get_release(loan_id).await? {
            Some(existing) => {
                warn!("Loan {} already has a release row; completing the release", loan_id);
                existing
            }
            None => self.insert_release(ctx, &loan, request).await?,
        };

        let changes = LoanApplicationChanges {
            status: LoanStatus::Released,
            reviewed_by: None,
            review_remarks: None,
            updated_at: Utc::now(),
        };
        let application = self.loans.update_loan(loan_id, &changes).await?;

        self.activity
            .record(
                ctx,
                actions::LOAN_RELEASED,
                entities::LOAN,
                Some(loan_id),
                Some(json!({
                    "principal": release.principal,
                    "interest_amount": release.interest_amount,
                    "total_payable": release.total_payable,
                    "due_date": release.due_date,
                })),
            )
            .await;

        info!("Released loan {}: total payable {}", loan_id, release.total_payable);
        let outstanding = release.total_payable;
        Ok(LoanDetailResponse {
            application,
            release: Some(release),
            payments: Vec::new(),
            outstanding_balance: Some(outstanding),
        })
    }

    async fn insert_release(
        &self,
        ctx: &MemberContext,
        loan: &LoanApplication,
        request: ReleaseLoanRequest,
    ) -> Result<LoanRelease> {
        let interest_rate = self
            .settings
            .loan_settings()
            .await?
            .interest_rate
            .unwrap_or(Decimal::ZERO);
        let principal = loan.amount_requested;
        let interest_amount = percentage_of(principal, interest_rate);
        let release_date = request.release_date.unwrap_or_else(|| Local::now().date_naive());
        let due_date = due_date(release_date, loan.term_months)
            .ok_or_else(|| DomainError::validation("Loan due date is out of range"))?;

        let row = NewLoanReleaseRow {
            loan_id: loan.id,
            principal,
            interest_rate,
            interest_amount,
            total_payable: principal + interest_amount,
            release_date,
            due_date,
            released_by: ctx.member_id,
        };
        self.loans.insert_release(&row).await
    }

    /// Payments recorded against a loan, oldest first
    pub async fn list_payments(&self, ctx: &MemberContext, loan_id: Uuid) -> Result<Vec<LoanPayment>> {
        let loan = self.load_loan(loan_id).await?;
        ctx.require_self_or_board(loan.member_id)?;
        self.loans.list_payments(loan_id).await
    }

    /// Record a repayment; paying off the balance marks the loan paid
    pub async fn record_payment(
        &self,
        ctx: &MemberContext,
        loan_id: Uuid,
        request: RecordPaymentRequest,
    ) -> Result<LoanPayment> {
        ctx.require_board("record loan payments")?;
        let loan = self.load_loan(loan_id).await?;
        if loan.status != LoanStatus::Released {
            return Err(DomainError::validation(format!(
                "Payments can only be recorded for released loans (loan is {})",
                loan.status
            ))
            .into());
        }

        let release = self
            .loans
            .get_release(loan_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Loan release", loan_id))?;
        let payments = self.loans.list_payments(loan_id).await?;
        let remaining = outstanding_balance(&release, &payments);

        if request.amount <= Decimal::ZERO {
            return Err(DomainError::validation("Payment amount must be positive").into());
        }
        if request.amount > remaining {
            return Err(DomainError::validation(format!(
                "Payment {} exceeds the remaining balance {}",
                request.amount, remaining
            ))
            .into());
        }

        let row = NewLoanPaymentRow {
            loan_id,
            amount: request.amount,
            payment_date: request.payment_date.unwrap_or_else(|| Local::now().date_naive()),
            remaining_balance: remaining - request.amount,
            recorded_by: ctx.member_id,
            remarks: request.remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
        };
        let payment = self.loans.insert_payment(&row).await?;

        self.activity
            .record(
                ctx,
                actions::LOAN_PAYMENT_RECORDED,
                entities::LOAN,
                Some(loan_id),
                Some(json!({
                    "amount": payment.amount,
                    "remaining_balance": payment.remaining_balance,
                })),
            )
            .await;

        if payment.remaining_balance.is_zero() {
            ensure_transition(loan.status, LoanStatus::Paid)?;
            let changes = LoanApplicationChanges {
                status: LoanStatus::Paid,
                reviewed_by: None,
                review_remarks: None,
                updated_at: Utc::now(),
            };
            self.loans.update_loan(loan_id, &changes).await?;
            info!("Loan {} is fully paid", loan_id);
        }

        Ok(payment)
    }
}
