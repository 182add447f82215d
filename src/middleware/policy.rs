// src/middleware/policy.rs

// Política de autorização em UM lugar só. Os handlers não comparam
// strings de papel: perguntam aqui o que o papel pode ver e fazer.

use uuid::Uuid;

use crate::models::auth::Role;

/// O que uma listagem de transações deve devolver para este chamador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Todas as transações ativas (admin, manager, agent).
    All,
    /// Só as transações com linha de atribuição para este usuário.
    /// É filtro de listagem, não negação de acesso.
    AssignedOnly(Uuid),
}

pub fn visibility(role: Role, user_id: Uuid) -> Visibility {
    match role {
        Role::Assistant => Visibility::AssignedOnly(user_id),
        Role::Admin | Role::Manager | Role::Agent => Visibility::All,
    }
}

/// Soft-delete de transação: só admin e manager.
pub fn can_delete_transactions(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Manager)
}

/// Atribuir assistentes a transações: quem gerencia a equipe.
pub fn can_manage_assignments(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Manager)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistente_ve_apenas_atribuidas() {
        let id = Uuid::new_v4();
        assert_eq!(visibility(Role::Assistant, id), Visibility::AssignedOnly(id));
    }

    #[test]
    fn demais_papeis_veem_tudo() {
        let id = Uuid::new_v4();
        assert_eq!(visibility(Role::Admin, id), Visibility::All);
        assert_eq!(visibility(Role::Manager, id), Visibility::All);
        assert_eq!(visibility(Role::Agent, id), Visibility::All);
    }

    #[test]
    fn delete_restrito_a_admin_e_manager() {
        assert!(can_delete_transactions(Role::Admin));
        assert!(can_delete_transactions(Role::Manager));
        assert!(!can_delete_transactions(Role::Agent));
        assert!(!can_delete_transactions(Role::Assistant));
    }
}
