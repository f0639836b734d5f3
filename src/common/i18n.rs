// src/common/i18n.rs

use std::collections::HashMap;

// Idioma usado quando o Accept-Language não é suportado
pub const DEFAULT_LANG: &str = "pt";

/// Catálogo de mensagens de erro por idioma.
/// A chave é o código estável do erro (ver `AppError::code`).
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let pt: HashMap<_, _> = [
            ("validation", "Um ou mais campos são inválidos."),
            ("missing_field", "O campo '{field}' é obrigatório."),
            ("email_already_exists", "Este e-mail já está cadastrado."),
            ("duplicate_field", "Erro: {field} {value} já está cadastrado."),
            ("invalid_credentials", "Email, senha ou permissão inválidos."),
            ("invalid_token", "Token de autenticação inválido ou ausente."),
            ("agent_not_found", "Usuário não encontrado."),
            ("forbidden", "Você não tem permissão para acessar este recurso."),
            ("admin_only", "Apenas administradores podem realizar esta ação."),
            ("not_found", "{entity} não encontrado."),
            ("invalid_upload", "Arquivo inválido: {reason}"),
            ("invalid_csv", "Ocorreu um erro ao processar o arquivo. Verifique se os nomes das colunas estão corretos. Erro: {reason}"),
            ("nothing_to_export", "Não há clientes para exportar."),
            ("internal", "Ocorreu um erro inesperado."),
        ]
        .into_iter()
        .collect();

        let en: HashMap<_, _> = [
            ("validation", "One or more fields are invalid."),
            ("missing_field", "The field '{field}' is required."),
            ("email_already_exists", "This e-mail is already registered."),
            ("duplicate_field", "Error: {field} {value} is already registered."),
            ("invalid_credentials", "Invalid e-mail, password or permission."),
            ("invalid_token", "Missing or invalid authentication token."),
            ("agent_not_found", "User not found."),
            ("forbidden", "You are not allowed to access this resource."),
            ("admin_only", "Only administrators can perform this action."),
            ("not_found", "{entity} not found."),
            ("invalid_upload", "Invalid file: {reason}"),
            ("invalid_csv", "The file could not be processed. Check the column names. Error: {reason}"),
            ("nothing_to_export", "There are no clients to export."),
            ("internal", "An unexpected error occurred."),
        ]
        .into_iter()
        .collect();

        let mut catalogs = HashMap::new();
        catalogs.insert("pt", pt);
        catalogs.insert("en", en);
        Self { catalogs }
    }

    /// Traduz o código e substitui os `{placeholders}` pelos argumentos.
    pub fn translate(&self, lang: &str, code: &str, args: &[(&str, &str)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(code))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(code)))
            .copied()
            .unwrap_or(code);

        args.iter().fold(template.to_string(), |msg, (key, value)| {
            msg.replace(&format!("{{{}}}", key), value)
        })
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_portuguese_for_unknown_language() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate("de", "nothing_to_export", &[]),
            "Não há clientes para exportar."
        );
    }

    #[test]
    fn substitutes_placeholders() {
        let store = I18nStore::new();
        let msg = store.translate("pt", "duplicate_field", &[("field", "CPF"), ("value", "123")]);
        assert_eq!(msg, "Erro: CPF 123 já está cadastrado.");
    }

    #[test]
    fn unknown_code_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "no_such_code", &[]), "no_such_code");
    }
}
