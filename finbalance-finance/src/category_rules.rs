//! Deterministic keyword rules mapping a free-text description to an
//! expense category and a payment method.
//!
//! Rules are tried top to bottom against the lowercased description; the
//! first rule with a matching keyword wins.

use finbalance_core::{ExpenseCategory, PaymentMethod};

const CATEGORY_RULES: &[(&[&str], ExpenseCategory)] = &[
    (
        &[
            "mercado", "supermercado", "feira", "açougue", "padaria", "restaurante", "lanche",
            "comida", "almoço", "jantar", "café",
        ],
        ExpenseCategory::Alimentacao,
    ),
    (
        &[
            "uber", "99", "taxi", "ônibus", "metrô", "gasolina", "combustível", "estacionamento",
        ],
        ExpenseCategory::Transporte,
    ),
    (
        &[
            "cinema", "netflix", "spotify", "show", "festa", "bar", "balada", "entretenimento",
        ],
        ExpenseCategory::Lazer,
    ),
    (
        &["farmácia", "médico", "hospital", "plano de saúde", "remédio", "consulta"],
        ExpenseCategory::Saude,
    ),
    (
        &["curso", "livro", "escola", "faculdade", "mensalidade"],
        ExpenseCategory::Educacao,
    ),
    (
        &["aluguel", "condomínio", "luz", "água", "gás", "internet", "iptu"],
        ExpenseCategory::Moradia,
    ),
    (&["cartão", "fatura", "crédito"], ExpenseCategory::CartaoCredito),
    // "mensalidade" is already taken by Educação above
    (&["conta fixa", "mensalidade", "assinatura"], ExpenseCategory::Fixo),
];

const PAYMENT_RULES: &[(&[&str], PaymentMethod)] = &[
    (&["crédito", "cartão de crédito"], PaymentMethod::Credito),
    (&["débito", "cartão de débito"], PaymentMethod::Debito),
    (&["pix"], PaymentMethod::Pix),
    (&["dinheiro", "cash", "espécie"], PaymentMethod::Dinheiro),
    (&["transferência", "ted", "doc"], PaymentMethod::Transferencia),
];

/// Category used when no rule matches a chat-reported expense
pub const FALLBACK_CATEGORY: ExpenseCategory = ExpenseCategory::GastoVariavel;

/// Payment method used when no rule matches
pub const FALLBACK_PAYMENT_METHOD: PaymentMethod = PaymentMethod::Debito;

/// Categorize an expense description.
pub fn categorize(description: &str) -> ExpenseCategory {
    first_match(description, CATEGORY_RULES).unwrap_or(FALLBACK_CATEGORY)
}

/// Detect how an expense was paid from its description.
pub fn detect_payment_method(description: &str) -> PaymentMethod {
    first_match(description, PAYMENT_RULES).unwrap_or(FALLBACK_PAYMENT_METHOD)
}

fn first_match<T: Copy>(description: &str, rules: &[(&[&str], T)]) -> Option<T> {
    let desc = description.to_lowercase();
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(_, value)| *value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_words() {
        assert_eq!(categorize("mercado"), ExpenseCategory::Alimentacao);
        assert_eq!(categorize("Almoço com a equipe"), ExpenseCategory::Alimentacao);
        assert_eq!(categorize("PADARIA"), ExpenseCategory::Alimentacao);
    }

    #[test]
    fn test_each_rule_reachable() {
        assert_eq!(categorize("uber pro trabalho"), ExpenseCategory::Transporte);
        assert_eq!(categorize("cinema"), ExpenseCategory::Lazer);
        assert_eq!(categorize("farmácia"), ExpenseCategory::Saude);
        assert_eq!(categorize("curso de inglês"), ExpenseCategory::Educacao);
        assert_eq!(categorize("conta de luz"), ExpenseCategory::Moradia);
        assert_eq!(categorize("fatura"), ExpenseCategory::CartaoCredito);
        assert_eq!(categorize("assinatura"), ExpenseCategory::Fixo);
    }

    #[test]
    fn test_earliest_rule_wins() {
        // food and transport both match; food is declared first
        assert_eq!(categorize("uber para o restaurante"), ExpenseCategory::Alimentacao);
        // both Educação and Fixo list it
        assert_eq!(categorize("mensalidade"), ExpenseCategory::Educacao);
        // "bar" is a substring of "barbearia"
        assert_eq!(categorize("barbearia"), ExpenseCategory::Lazer);
    }

    #[test]
    fn test_fallback_category() {
        assert_eq!(categorize("presente da minha mãe"), ExpenseCategory::GastoVariavel);
        assert_eq!(categorize(""), ExpenseCategory::GastoVariavel);
    }

    #[test]
    fn test_payment_methods() {
        assert_eq!(detect_payment_method("tênis no crédito"), PaymentMethod::Credito);
        assert_eq!(detect_payment_method("Cartão de Débito"), PaymentMethod::Debito);
        assert_eq!(detect_payment_method("aluguel via pix"), PaymentMethod::Pix);
        assert_eq!(detect_payment_method("feira em dinheiro"), PaymentMethod::Dinheiro);
        assert_eq!(detect_payment_method("ted pro joão"), PaymentMethod::Transferencia);
    }

    #[test]
    fn test_payment_fallback_and_substrings() {
        assert_eq!(detect_payment_method("mercado"), PaymentMethod::Debito);
        // "doc" inside "doce"
        assert_eq!(detect_payment_method("doce"), PaymentMethod::Transferencia);
    }
}
