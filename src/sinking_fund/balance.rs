//! Keeping sinking fund balances in line with their transaction history.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::Date;

use crate::{
    Error,
    sinking_fund::{SinkingFund, SinkingFundId, get_active_funds, get_fund_category, get_sinking_fund},
    transaction::{Transaction, TransactionKind, create_transaction},
};

/// Recompute the balance of every active fund from its transactions.
///
/// The balance of a fund is the sum of its contributions minus the sum of its
/// withdrawals. Stored balances that differ are overwritten in one statement.
///
/// Returns the active funds with their corrected balances, ordered by name.
pub fn reconcile_balances(connection: &Connection) -> Result<Vec<SinkingFund>, Error> {
    let rows_corrected = connection.execute(
        "WITH calculated AS (
            SELECT sf.id AS sinking_fund_id,
                COALESCE(SUM(
                    CASE t.kind
                        WHEN 'contribution' THEN t.amount
                        WHEN 'withdrawal' THEN -t.amount
                        ELSE 0
                    END
                ), 0) AS balance
            FROM sinking_fund sf
            LEFT JOIN \"transaction\" t ON t.sinking_fund_id = sf.id
            WHERE sf.is_active = 1
            GROUP BY sf.id
        )
        UPDATE sinking_fund
        SET current_balance = calculated.balance
        FROM calculated
        WHERE sinking_fund.id = calculated.sinking_fund_id
            AND sinking_fund.current_balance != calculated.balance",
        [],
    )?;

    if rows_corrected > 0 {
        tracing::info!("corrected the balance of {rows_corrected} sinking funds");
    }

    get_active_funds(connection)
}

/// Record a manual contribution to, or withdrawal from, a sinking fund.
///
/// The transaction is filed under the fund's category and the fund's balance
/// is updated in the same database transaction. A blank description is
/// replaced with one naming the fund.
///
/// # Errors
/// Returns:
/// - [Error::NotFound] if the fund does not exist,
/// - [Error::InvalidFormValue] if `kind` is an expense,
/// - [Error::InvalidAmount] if `amount` is not positive,
/// - [Error::MissingFundCategory] if the fund has no category,
/// - [Error::InsufficientFundBalance] if a withdrawal exceeds the balance.
pub fn record_fund_transaction(
    sinking_fund_id: SinkingFundId,
    kind: TransactionKind,
    amount: f64,
    description: &str,
    date: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if kind == TransactionKind::Expense {
        return Err(Error::InvalidFormValue("transaction type".to_owned()));
    }

    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    let sql_transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let fund = get_sinking_fund(sinking_fund_id, &sql_transaction)?;

    let Some(category_id) = get_fund_category(fund.id, &sql_transaction)? else {
        return Err(Error::MissingFundCategory(fund.name));
    };

    if kind == TransactionKind::Withdrawal && fund.current_balance < amount {
        return Err(Error::InsufficientFundBalance {
            balance: fund.current_balance,
            requested: amount,
        });
    }

    let description = match description.trim() {
        "" if kind == TransactionKind::Withdrawal => format!("Withdrawal from {}", fund.name),
        "" => format!("Contribution to {}", fund.name),
        description => description.to_owned(),
    };

    let transaction = create_transaction(
        Transaction::build(amount, date, &description, category_id)
            .sinking_fund_id(Some(fund.id))
            .kind(kind),
        &sql_transaction,
    )?;

    let balance_change = match kind {
        TransactionKind::Withdrawal => -amount,
        _ => amount,
    };

    sql_transaction.execute(
        "UPDATE sinking_fund SET current_balance = current_balance + ?1 WHERE id = ?2",
        (balance_change, fund.id),
    )?;

    sql_transaction.commit()?;

    tracing::info!("recorded {kind} of {amount:.2} for sinking fund \"{}\"", fund.name);

    Ok(transaction)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryName, create_category},
        db::get_test_connection,
        sinking_fund::{SinkingFund, create_sinking_fund, get_sinking_fund, set_fund_category},
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{reconcile_balances, record_fund_transaction};

    fn vehicle_fund(connection: &Connection) -> SinkingFund {
        let category = create_category(CategoryName::new_unchecked("Car"), connection).unwrap();
        let fund = create_sinking_fund("Vehicle", 100_000.0, 24_500.0, connection).unwrap();
        set_fund_category(fund.id, category.id, connection).unwrap();
        fund
    }

    #[test]
    fn reconcile_sets_balance_from_transactions() {
        let connection = get_test_connection();
        let fund = vehicle_fund(&connection);
        let category_id = 1;
        for (amount, kind) in [
            (500.0, TransactionKind::Contribution),
            (300.0, TransactionKind::Contribution),
            (200.0, TransactionKind::Withdrawal),
        ] {
            create_transaction(
                Transaction::build(amount, date!(2025 - 10 - 01), "", category_id)
                    .sinking_fund_id(Some(fund.id))
                    .kind(kind),
                &connection,
            )
            .unwrap();
        }
        // An ordinary expense in the same category does not affect the fund.
        create_transaction(
            Transaction::build(75.0, date!(2025 - 10 - 01), "Tyres", category_id),
            &connection,
        )
        .unwrap();
        connection
            .execute("UPDATE sinking_fund SET current_balance = 12345", [])
            .unwrap();

        let funds = reconcile_balances(&connection).unwrap();

        assert_eq!(funds.len(), 1);
        assert_eq!(funds[0].current_balance, 600.0);
        assert_eq!(
            get_sinking_fund(fund.id, &connection).unwrap().current_balance,
            600.0
        );
    }

    #[test]
    fn reconcile_resets_fund_without_transactions() {
        let connection = get_test_connection();
        let fund = vehicle_fund(&connection);
        connection
            .execute("UPDATE sinking_fund SET current_balance = 50", [])
            .unwrap();

        reconcile_balances(&connection).unwrap();

        assert_eq!(
            get_sinking_fund(fund.id, &connection).unwrap().current_balance,
            0.0
        );
    }

    #[test]
    fn contribution_then_withdrawal_updates_balance() {
        let connection = get_test_connection();
        let fund = vehicle_fund(&connection);
        let today = date!(2025 - 10 - 10);

        record_fund_transaction(
            fund.id,
            TransactionKind::Contribution,
            1000.0,
            "",
            today,
            &connection,
        )
        .unwrap();
        let withdrawal = record_fund_transaction(
            fund.id,
            TransactionKind::Withdrawal,
            250.0,
            "",
            today,
            &connection,
        )
        .unwrap();

        assert_eq!(withdrawal.description, "Withdrawal from Vehicle");
        assert_eq!(withdrawal.category_id, 1);
        assert_eq!(
            get_sinking_fund(fund.id, &connection).unwrap().current_balance,
            750.0
        );
        // Reconciling agrees with the running balance.
        assert_eq!(reconcile_balances(&connection).unwrap()[0].current_balance, 750.0);
    }

    #[test]
    fn withdrawal_larger_than_balance_is_refused() {
        let connection = get_test_connection();
        let fund = vehicle_fund(&connection);

        let result = record_fund_transaction(
            fund.id,
            TransactionKind::Withdrawal,
            10.0,
            "Service",
            date!(2025 - 10 - 10),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::InsufficientFundBalance {
                balance: 0.0,
                requested: 10.0
            })
        );
    }

    #[test]
    fn missing_fund_is_not_found() {
        let connection = get_test_connection();

        let result = record_fund_transaction(
            42,
            TransactionKind::Contribution,
            10.0,
            "",
            date!(2025 - 10 - 10),
            &connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn expense_kind_is_rejected() {
        let connection = get_test_connection();
        let fund = vehicle_fund(&connection);

        let result = record_fund_transaction(
            fund.id,
            TransactionKind::Expense,
            10.0,
            "",
            date!(2025 - 10 - 10),
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidFormValue(_))));
    }
}
