//! Initial database migration.
//!
//! Creates the ledger schema: enums, accounts, categories, transactions,
//! recurrence templates, budgets, the operation log and the audit log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(TOUCH_UPDATED_AT_SQL).await?;

        // ============================================================
        // PART 2: ACCOUNTS & CATEGORIES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(CATEGORIES_SQL).await?;

        // ============================================================
        // PART 3: TRANSACTIONS & RECURRENCE
        // ============================================================
        db.execute_unprepared(RECURRENCE_TEMPLATES_SQL).await?;
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 4: BUDGETS
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;

        // ============================================================
        // PART 5: OPERATION LOG & AUDIT
        // ============================================================
        db.execute_unprepared(OPERATION_LOGS_SQL).await?;
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & SEED DATA
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;
        db.execute_unprepared(SEED_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('checking', 'credit_card', 'investment', 'wallet');
CREATE TYPE transaction_type AS ENUM ('debit', 'credit');
CREATE TYPE transaction_status AS ENUM ('paid', 'pending', 'cancelled');
";

const TOUCH_UPDATED_AT_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    allow_negative_balance BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    credit_limit NUMERIC(15, 2),
    closing_day SMALLINT,
    due_day SMALLINT,
    debit_account_id UUID REFERENCES accounts(id),
    enforce_credit_limit BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_credit_card_fields CHECK (
        (account_type = 'credit_card'
            AND credit_limit IS NOT NULL AND credit_limit >= 0
            AND closing_day BETWEEN 1 AND 31
            AND due_day BETWEEN 1 AND 31)
        OR (account_type <> 'credit_card'
            AND credit_limit IS NULL AND closing_day IS NULL AND due_day IS NULL)
    ),
    CONSTRAINT chk_non_negative_balance CHECK (
        allow_negative_balance OR account_type = 'credit_card' OR balance >= 0
    )
);

CREATE INDEX idx_accounts_type ON accounts(account_type) WHERE is_active;
";

const CATEGORIES_SQL: &str = r"
CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL UNIQUE,
    is_system BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const RECURRENCE_TEMPLATES_SQL: &str = r"
CREATE TABLE recurrence_templates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES accounts(id),
    category_id UUID NOT NULL REFERENCES categories(id),
    transaction_type transaction_type NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    description TEXT NOT NULL,
    day_of_month SMALLINT NOT NULL CHECK (day_of_month BETWEEN 1 AND 31),
    is_active BOOLEAN NOT NULL DEFAULT true,
    last_generated_date DATE,
    default_status transaction_status NOT NULL DEFAULT 'pending'
        CHECK (default_status <> 'cancelled'),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_recurrence_active ON recurrence_templates(id) WHERE is_active;
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES accounts(id),
    category_id UUID NOT NULL REFERENCES categories(id),
    transaction_type transaction_type NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    description TEXT NOT NULL,
    competence_date DATE NOT NULL,
    due_date DATE,
    status transaction_status NOT NULL,
    installment_group_id UUID,
    installment_number INTEGER,
    total_installments INTEGER,
    transfer_group_id UUID,
    recurrence_template_id UUID REFERENCES recurrence_templates(id),
    original_transaction_id UUID REFERENCES transactions(id),
    has_adjustment BOOLEAN NOT NULL DEFAULT false,
    cancellation_reason TEXT,
    cancelled_by UUID,
    cancelled_at TIMESTAMPTZ,
    operation_id VARCHAR(255),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_installment_fields CHECK (
        (installment_group_id IS NULL AND installment_number IS NULL AND total_installments IS NULL)
        OR (installment_group_id IS NOT NULL
            AND total_installments >= 2
            AND installment_number BETWEEN 1 AND total_installments)
    ),
    CONSTRAINT chk_cancellation_fields CHECK (
        (status = 'cancelled') = (cancelled_at IS NOT NULL)
    )
);

CREATE INDEX idx_txn_account_date ON transactions(account_id, competence_date);
CREATE INDEX idx_txn_installment_group ON transactions(installment_group_id)
    WHERE installment_group_id IS NOT NULL;
CREATE INDEX idx_txn_transfer_group ON transactions(transfer_group_id)
    WHERE transfer_group_id IS NOT NULL;
CREATE INDEX idx_txn_original ON transactions(original_transaction_id)
    WHERE original_transaction_id IS NOT NULL;
CREATE UNIQUE INDEX idx_txn_recurrence_occurrence
    ON transactions(recurrence_template_id, competence_date)
    WHERE recurrence_template_id IS NOT NULL AND original_transaction_id IS NULL;
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    percentage NUMERIC(5, 2) NOT NULL CHECK (percentage > 0 AND percentage <= 100),
    reference_year INTEGER NOT NULL,
    reference_month SMALLINT NOT NULL CHECK (reference_month BETWEEN 1 AND 12),
    is_recurrent BOOLEAN NOT NULL DEFAULT false,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_budgets_reference ON budgets(reference_year, reference_month);

CREATE TABLE budget_categories (
    budget_id UUID NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
    category_id UUID NOT NULL REFERENCES categories(id),
    PRIMARY KEY (budget_id, category_id)
);
";

const OPERATION_LOGS_SQL: &str = r"
CREATE TABLE operation_logs (
    operation_id VARCHAR(255) PRIMARY KEY,
    operation_type VARCHAR(50) NOT NULL,
    result_entity_id UUID,
    result_payload JSONB NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX idx_operation_logs_expires ON operation_logs(expires_at);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entity_type VARCHAR(50) NOT NULL,
    entity_id UUID NOT NULL,
    action VARCHAR(50) NOT NULL,
    user_id UUID NOT NULL,
    previous_data JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_entity ON audit_logs(entity_type, entity_id, created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE TRIGGER trg_accounts_updated_at BEFORE UPDATE ON accounts
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_transactions_updated_at BEFORE UPDATE ON transactions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_recurrence_templates_updated_at BEFORE UPDATE ON recurrence_templates
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
CREATE TRIGGER trg_budgets_updated_at BEFORE UPDATE ON budgets
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const SEED_SQL: &str = r"
INSERT INTO categories (name, is_system) VALUES ('Pagamento de Fatura', true)
ON CONFLICT (name) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
-- Order matters due to foreign key constraints
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS operation_logs CASCADE;
DROP TABLE IF EXISTS budget_categories CASCADE;
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS recurrence_templates CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP FUNCTION IF EXISTS touch_updated_at() CASCADE;

DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS transaction_type;
DROP TYPE IF EXISTS account_type;
";
