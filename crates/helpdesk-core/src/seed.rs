//! Built-in snapshot data.
//!
//! Serves both as the read-only fallback when the primary store is
//! unreachable and as the initial contents of a fresh database.

use crate::types::{KnowledgeEntry, Role, UserRecord};

fn entry(id: i64, question: &str, steps: &[&str]) -> KnowledgeEntry {
    KnowledgeEntry {
        id,
        question: question.to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
    }
}

/// The five-entry troubleshooting knowledge base.
pub fn knowledge_base() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            1,
            "My computer won't start after a Windows update",
            &[
                "Hold power button for 10 seconds to force shutdown",
                "Restart and press F8 repeatedly during boot to access Safe Mode",
                "In Safe Mode, go to Settings > Update & Security > Recovery",
                "Click 'Go back to the previous version of Windows 10' if available",
                "If not available, try System Restore from Advanced startup options",
                "Use Windows Recovery Environment if the above doesn't work",
            ],
        ),
        entry(
            2,
            "Internet connection is slow or not working",
            &[
                "Check if other devices can connect to the internet",
                "Restart your router by unplugging it for 30 seconds",
                "Run Windows Network Troubleshooter: Settings > Network & Internet > Status > Network troubleshooter",
                "Reset network settings: netsh winsock reset in Command Prompt (as admin)",
                "Update network adapter drivers through Device Manager",
                "Contact your ISP if the issue persists across all devices",
            ],
        ),
        entry(
            3,
            "Application keeps crashing or freezing",
            &[
                "Close the application completely and restart it",
                "Check for application updates in the software or Microsoft Store",
                "Restart your computer to clear temporary files and processes",
                "Run the application as administrator (right-click > Run as administrator)",
                "Check Windows Event Viewer for specific error messages",
                "Uninstall and reinstall the application if issues persist",
            ],
        ),
        entry(
            4,
            "Computer is running very slowly",
            &[
                "Check Task Manager (Ctrl+Shift+Esc) for high CPU/memory usage",
                "Close unnecessary programs and browser tabs",
                "Run Disk Cleanup to free up storage space",
                "Disable startup programs: Task Manager > Startup tab",
                "Run Windows Defender full system scan",
                "Consider adding more RAM or upgrading to an SSD if hardware is old",
            ],
        ),
        entry(
            5,
            "Can't print documents from my computer",
            &[
                "Check if printer is powered on and connected (USB/WiFi)",
                "Verify paper is loaded and there are no paper jams",
                "Run Windows printer troubleshooter: Settings > Devices > Printers & scanners",
                "Update printer drivers from manufacturer's website",
                "Remove and re-add the printer in Windows settings",
                "Try printing a test page from printer properties",
            ],
        ),
    ]
}

/// Demo accounts accepted when the user store has no match or is offline.
pub fn demo_users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: 1,
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
            name: "Admin User".to_string(),
            role: Role::Admin,
        },
        UserRecord {
            id: 2,
            email: "user@example.com".to_string(),
            password: "user123".to_string(),
            name: "Regular User".to_string(),
            role: Role::User,
        },
    ]
}
